use std::sync::Arc;

use tracing::instrument;

use crate::{domain::CartLine, errors::ServiceError, services::payments::PaymentGateway};

/// Checkout use case: derives the callback URLs for a payment session and
/// delegates session creation to the payment gateway port.
///
/// The use case performs no error handling of its own; gateway failures
/// propagate unchanged. Non-empty `items` is the endpoint boundary's job.
pub struct CreateCheckout {
    gateway: Arc<dyn PaymentGateway>,
}

impl CreateCheckout {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    /// Returns the hosted session's redirect URL for the given cart lines.
    ///
    /// `base_url` is an absolute origin without a trailing path segment,
    /// e.g. `https://host`.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn execute(
        &self,
        items: &[CartLine],
        base_url: &str,
    ) -> Result<String, ServiceError> {
        let success_url = format!("{base_url}/thanks");
        let cancel_url = format!("{base_url}/cart");
        let payment_failed_url = format!("{base_url}/payment-failed");

        self.gateway
            .create_checkout_session(items, &success_url, &cancel_url, Some(&payment_failed_url))
            .await
    }
}
