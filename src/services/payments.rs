use async_trait::async_trait;
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use tracing::{info, instrument};
use url::Url;

use crate::{domain::CartLine, errors::ServiceError};

const STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Port for creating hosted payment sessions.
///
/// The checkout use case talks to this trait only; the production
/// implementation is [`StripeGateway`], tests substitute their own.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a hosted checkout session for the given cart lines and returns
    /// the session's redirect URL, or an empty string when the provider
    /// returns none.
    async fn create_checkout_session(
        &self,
        items: &[CartLine],
        success_url: &str,
        cancel_url: &str,
        payment_failed_url: Option<&str>,
    ) -> Result<String, ServiceError>;
}

/// Payment gateway backed by Stripe's hosted Checkout Sessions API.
///
/// Sessions are created in single "payment" mode with card as the only
/// method. No retries and no caching; provider failures propagate to the
/// caller unchanged.
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: Option<String>,
    currency: String,
    api_base: String,
}

impl StripeGateway {
    pub fn new(secret_key: Option<String>, currency: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            currency: currency.into(),
            api_base: STRIPE_API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, items))]
    async fn create_checkout_session(
        &self,
        items: &[CartLine],
        success_url: &str,
        cancel_url: &str,
        payment_failed_url: Option<&str>,
    ) -> Result<String, ServiceError> {
        let secret = self.secret_key.as_deref().ok_or_else(|| {
            ServiceError::ConfigurationError(
                "payment provider API key is not configured".to_string(),
            )
        })?;

        let form = build_session_form(
            items,
            success_url,
            cancel_url,
            payment_failed_url,
            &self.currency,
        )?;

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(secret)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!(
                    "checkout session request failed: {e}"
                ))
            })?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("invalid provider response: {e}"))
        })?;

        if !status.is_success() {
            let detail = body
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown provider error");
            return Err(ServiceError::ExternalServiceError(format!(
                "provider rejected checkout session: {detail}"
            )));
        }

        let redirect_url = body
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        info!(items = items.len(), "Created hosted checkout session");
        Ok(redirect_url)
    }
}

/// Builds the form-encoded session parameters for the provider.
///
/// The failure-redirect URL travels in payment-intent metadata with an
/// error-placeholder token so a later failure can be told apart from a
/// cancellation.
pub(crate) fn build_session_form(
    items: &[CartLine],
    success_url: &str,
    cancel_url: &str,
    payment_failed_url: Option<&str>,
    currency: &str,
) -> Result<Vec<(String, String)>, ServiceError> {
    let base_url = checkout_base_url(success_url);
    let error_url = payment_failed_url
        .map(|u| format!("{u}?error={{CHECKOUT_ERROR}}"))
        .unwrap_or_else(|| cancel_url.to_string());

    let mut form: Vec<(String, String)> = vec![
        ("mode".into(), "payment".into()),
        ("payment_method_types[0]".into(), "card".into()),
        ("success_url".into(), success_url.into()),
        ("cancel_url".into(), cancel_url.into()),
        ("payment_intent_data[metadata][error_url]".into(), error_url),
    ];

    for (i, line) in items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.push((format!("{prefix}[quantity]"), line.quantity.to_string()));
        form.push((
            format!("{prefix}[price_data][currency]"),
            currency.to_lowercase(),
        ));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            to_minor_units(line.product.price)?.to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            line.product.name.clone(),
        ));
        if !line.product.description.is_empty() {
            form.push((
                format!("{prefix}[price_data][product_data][description]"),
                line.product.description.clone(),
            ));
        }
        // The provider rejects the whole request over a non-HTTPS or
        // malformed image URL; omission is safer than failure.
        if let Some(image) = format_image_url(&line.product.image, base_url) {
            form.push((
                format!("{prefix}[price_data][product_data][images][0]"),
                image,
            ));
        }
    }

    Ok(form)
}

/// Converts a major-unit price to the provider's minor-currency-unit integer,
/// rounding to the nearest cent/ban.
pub(crate) fn to_minor_units(price: Decimal) -> Result<i64, ServiceError> {
    (price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| ServiceError::InvalidInput(format!("price {price} out of range")))
}

/// The checkout base origin: everything before the last `/` of the success
/// URL.
pub(crate) fn checkout_base_url(success_url: &str) -> &str {
    success_url
        .rfind('/')
        .map_or("", |idx| &success_url[..idx])
}

fn is_valid_https_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|u| u.scheme() == "https")
        .unwrap_or(false)
}

/// Normalizes a product image URL into an absolute HTTPS URL the provider
/// accepts, or `None` when no rule yields one.
///
/// Fallback order: already absolute HTTPS; root-relative prefixed with the
/// base origin; HTTPS-upgraded base origin. Anything else is dropped.
pub(crate) fn format_image_url(image_url: &str, base_url: &str) -> Option<String> {
    if is_valid_https_url(image_url) {
        return Some(image_url.to_string());
    }

    if !image_url.is_empty() && image_url.starts_with('/') {
        let full = format!("{base_url}{image_url}");
        if is_valid_https_url(&full) {
            return Some(full);
        }
    }

    if base_url.starts_with("http://") {
        let https_base = base_url.replacen("http://", "https://", 1);
        let full = if image_url.starts_with('/') {
            format!("{https_base}{image_url}")
        } else {
            format!("{https_base}/{image_url}")
        };
        if is_valid_https_url(&full) {
            return Some(full);
        }
    }

    None
}
