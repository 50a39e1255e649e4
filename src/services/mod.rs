pub mod cart_session;
pub mod checkout;
pub mod payments;

use std::sync::Arc;

use crate::{events::EventSender, notifications::Notifier, services::payments::PaymentGateway};

pub use cart_session::{CartSessionService, CartSnapshot};
pub use checkout::CreateCheckout;

/// Services layer used by the HTTP handlers, wired up once at startup and
/// passed around explicitly.
#[derive(Clone)]
pub struct AppServices {
    pub cart_sessions: Arc<CartSessionService>,
    pub checkout: Arc<CreateCheckout>,
}

impl AppServices {
    pub fn new(
        event_sender: EventSender,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let cart_sessions = match notifier {
            Some(notifier) => Arc::new(CartSessionService::with_notifier(
                event_sender.clone(),
                notifier,
            )),
            None => Arc::new(CartSessionService::new(event_sender.clone())),
        };

        Self {
            cart_sessions,
            checkout: Arc::new(CreateCheckout::new(gateway)),
        }
    }
}
