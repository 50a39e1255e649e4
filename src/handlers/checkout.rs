use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    domain::{CartLine, Product},
    errors::ApiError,
    events::Event,
    handlers::common::{success_response, validate_input},
    AppState,
};

/// One inbound cart line. Prices arrive as decimal major units; quantity must
/// be a positive integer or the request never reaches the payment adapter.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CheckoutItemRequest {
    pub product: CheckoutProductRequest,
    #[validate(range(min = 1))]
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CheckoutProductRequest {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom = "validate_non_negative_price")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
}

fn validate_non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price >= Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("range");
        err.message = Some("Price must not be negative".into());
        Err(err)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    #[serde(rename = "checkoutUrl")]
    pub checkout_url: String,
}

impl From<CheckoutItemRequest> for CartLine {
    fn from(item: CheckoutItemRequest) -> Self {
        CartLine {
            product: Product {
                id: item.product.id,
                name: item.product.name,
                description: item.product.description,
                price: item.product.price,
                image: item.product.image,
                category: item.product.category,
                tags: None,
                nutritional_info: None,
            },
            quantity: item.quantity,
        }
    }
}

/// Create a hosted payment session for the posted cart lines.
///
/// The whole request body is validated here, once, at the boundary: a
/// missing, empty, or non-array `items` field and any malformed line are
/// rejected with 400 before the payment adapter is involved. Adapter failures
/// surface as a generic 500.
#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Hosted checkout session created", body = CheckoutResponse),
        (status = 400, description = "Invalid cart items", body = crate::errors::ErrorResponse),
        (status = 405, description = "Method not allowed", body = crate::errors::ErrorResponse),
        (status = 500, description = "Payment session creation failed", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    // Deserialize by hand so a missing or non-array `items` is a 400, not a
    // body-extractor rejection.
    let request: CheckoutRequest =
        serde_json::from_value(payload).map_err(|_| ApiError::BadRequest {
            message: "Invalid cart items".to_string(),
            error_code: Some("INVALID_ITEMS".to_string()),
        })?;

    if request.items.is_empty() {
        return Err(ApiError::BadRequest {
            message: "Invalid cart items".to_string(),
            error_code: Some("EMPTY_CART".to_string()),
        });
    }

    for item in &request.items {
        validate_input(item)?;
        validate_input(&item.product)?;
    }

    let lines: Vec<CartLine> = request.items.into_iter().map(CartLine::from).collect();
    let base_url = request_base_url(&headers, state.config.is_production());

    let checkout_url = state
        .services
        .checkout
        .execute(&lines, &base_url)
        .await
        .map_err(|err| {
            error!("Checkout session creation failed: {}", err);
            ApiError::InternalServerError
        })?;

    state
        .event_sender
        .send_or_log(Event::CheckoutSessionCreated {
            item_count: lines.len(),
        })
        .await;

    Ok(success_response(CheckoutResponse { checkout_url }))
}

/// Derives the request's base origin for callback URLs.
///
/// `X-Forwarded-Proto`/`X-Forwarded-Host` win when present (the service runs
/// behind a proxy in production); otherwise the `Host` header plus the
/// environment-determined protocol. A trailing slash is stripped.
fn request_base_url(headers: &HeaderMap, is_production: bool) -> String {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let proto = header_str("x-forwarded-proto")
        .unwrap_or(if is_production { "https" } else { "http" });
    let host = header_str("x-forwarded-host")
        .or_else(|| {
            headers
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or("localhost:8080");

    format!("{proto}://{host}")
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn base_url_prefers_forwarded_headers() {
        let headers = headers(&[
            ("host", "internal:8080"),
            ("x-forwarded-host", "cantina.example"),
            ("x-forwarded-proto", "https"),
        ]);
        assert_eq!(
            request_base_url(&headers, false),
            "https://cantina.example"
        );
    }

    #[test]
    fn base_url_falls_back_to_host_and_environment_protocol() {
        let headers = headers(&[("host", "cantina.example")]);
        assert_eq!(request_base_url(&headers, true), "https://cantina.example");
        assert_eq!(request_base_url(&headers, false), "http://cantina.example");
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let headers = headers(&[("x-forwarded-host", "cantina.example/")]);
        assert_eq!(
            request_base_url(&headers, false),
            "http://cantina.example"
        );
    }

    #[test]
    fn base_url_defaults_when_no_host_present() {
        assert_eq!(
            request_base_url(&HeaderMap::new(), false),
            "http://localhost:8080"
        );
    }
}
