use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{Cart, CartLine, Product},
    errors::ServiceError,
    events::{Event, EventSender},
    notifications::{CartNotice, Notifier},
};

/// Immutable view of a session's cart, published after every mutation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartSnapshot {
    pub session_id: String,
    pub lines: Vec<CartLine>,
    pub total: Decimal,
}

/// Session-scoped cart state shared across request handlers.
///
/// Wraps the [`Cart`] aggregate: every mutating call performs the aggregate
/// operation, publishes a fresh snapshot, emits a domain event, and (when a
/// notifier is configured) a user-facing notice. Functional behavior is
/// identical with and without the notifier.
pub struct CartSessionService {
    carts: DashMap<String, Cart>,
    event_sender: EventSender,
    notifier: Option<Arc<dyn Notifier>>,
}

impl CartSessionService {
    pub fn new(event_sender: EventSender) -> Self {
        Self {
            carts: DashMap::new(),
            event_sender,
            notifier: None,
        }
    }

    pub fn with_notifier(event_sender: EventSender, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            carts: DashMap::new(),
            event_sender,
            notifier: Some(notifier),
        }
    }

    fn notify(&self, notice: CartNotice) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(notice);
        }
    }

    fn snapshot_of(session_id: &str, cart: &Cart) -> CartSnapshot {
        CartSnapshot {
            session_id: session_id.to_string(),
            lines: cart.lines().to_vec(),
            total: cart.total(),
        }
    }

    /// Creates an empty cart and returns its session id.
    pub fn create_session(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.carts.insert(session_id.clone(), Cart::new());
        session_id
    }

    /// Current snapshot for a session.
    pub fn snapshot(&self, session_id: &str) -> Result<CartSnapshot, ServiceError> {
        let cart = self
            .carts
            .get(session_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Cart session {session_id} not found")))?;
        Ok(Self::snapshot_of(session_id, &cart))
    }

    /// Adds `quantity` of `product`, merging with an existing line.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_item(
        &self,
        session_id: &str,
        product: Product,
        quantity: u32,
    ) -> Result<CartSnapshot, ServiceError> {
        let product_id = product.id.clone();
        let product_name = product.name.clone();

        let snapshot = {
            let mut cart = self.carts.get_mut(session_id).ok_or_else(|| {
                ServiceError::NotFound(format!("Cart session {session_id} not found"))
            })?;
            cart.add_item(product, quantity);
            Self::snapshot_of(session_id, &cart)
        };

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                session_id: session_id.to_string(),
                product_id,
                quantity,
            })
            .await;
        self.notify(CartNotice::ItemAdded { product_name });

        Ok(snapshot)
    }

    /// Sets the quantity of a line. A quantity of 0 removes the line instead
    /// of storing a non-positive value; the aggregate itself does not make
    /// that call, this adapter does.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        session_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<CartSnapshot, ServiceError> {
        if quantity == 0 {
            return self.remove_item(session_id, product_id).await;
        }

        let (snapshot, product_name) = {
            let mut cart = self.carts.get_mut(session_id).ok_or_else(|| {
                ServiceError::NotFound(format!("Cart session {session_id} not found"))
            })?;
            let product_name = cart
                .lines()
                .iter()
                .find(|l| l.product.id == product_id)
                .map(|l| l.product.name.clone());
            cart.update_quantity(product_id, quantity);
            (Self::snapshot_of(session_id, &cart), product_name)
        };

        self.event_sender
            .send_or_log(Event::CartQuantityUpdated {
                session_id: session_id.to_string(),
                product_id: product_id.to_string(),
                quantity,
            })
            .await;
        if let Some(product_name) = product_name {
            self.notify(CartNotice::QuantityUpdated {
                product_name,
                quantity,
            });
        }

        Ok(snapshot)
    }

    /// Removes the line for `product_id`; no-op when absent.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        session_id: &str,
        product_id: &str,
    ) -> Result<CartSnapshot, ServiceError> {
        let (snapshot, product_name) = {
            let mut cart = self.carts.get_mut(session_id).ok_or_else(|| {
                ServiceError::NotFound(format!("Cart session {session_id} not found"))
            })?;
            let product_name = cart
                .lines()
                .iter()
                .find(|l| l.product.id == product_id)
                .map(|l| l.product.name.clone());
            cart.remove_item(product_id);
            (Self::snapshot_of(session_id, &cart), product_name)
        };

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                session_id: session_id.to_string(),
                product_id: product_id.to_string(),
            })
            .await;
        if let Some(product_name) = product_name {
            self.notify(CartNotice::ItemRemoved { product_name });
        }

        Ok(snapshot)
    }

    /// Empties the session's cart.
    #[instrument(skip(self))]
    pub async fn clear(&self, session_id: &str) -> Result<CartSnapshot, ServiceError> {
        let snapshot = {
            let mut cart = self.carts.get_mut(session_id).ok_or_else(|| {
                ServiceError::NotFound(format!("Cart session {session_id} not found"))
            })?;
            cart.clear();
            Self::snapshot_of(session_id, &cart)
        };

        self.event_sender
            .send_or_log(Event::CartCleared {
                session_id: session_id.to_string(),
            })
            .await;
        self.notify(CartNotice::Cleared);

        Ok(snapshot)
    }
}
