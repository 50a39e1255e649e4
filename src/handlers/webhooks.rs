use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use bytes::Bytes;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::{info, warn};

use crate::{
    errors::{ApiError, ServiceError},
    events::Event,
    AppState,
};

type HmacSha256 = Hmac<Sha256>;

/// Inbound payment provider webhook.
///
/// The raw body is required: signature verification runs over the exact byte
/// sequence, before any event data is trusted. Once verification passes the
/// event is always acknowledged with 200 so the provider stops retrying,
/// whatever the event type.
#[utoipa::path(
    post,
    path = "/api/webhooks",
    request_body = String,
    responses(
        (status = 200, description = "Event accepted"),
        (status = 400, description = "Invalid signature or payload", body = crate::errors::ErrorResponse),
        (status = 500, description = "Webhook secret not configured", body = crate::errors::ErrorResponse)
    ),
    tag = "Webhooks"
)]
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let secret = state.config.stripe_webhook_secret.as_deref().ok_or_else(|| {
        ApiError::ServiceError(ServiceError::ConfigurationError(
            "webhook signing secret is not configured".to_string(),
        ))
    })?;

    if !verify_signature(&headers, &body, secret, state.config.webhook_tolerance_secs) {
        warn!("Webhook signature verification failed");
        return Err(ApiError::BadRequest {
            message: "Webhook signature verification failed".to_string(),
            error_code: None,
        });
    }

    let event: Value = serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest {
        message: format!("Invalid webhook payload: {e}"),
        error_code: None,
    })?;

    let event_type = event.get("type").and_then(|v| v.as_str()).unwrap_or("");
    let object_id = event
        .pointer("/data/object/id")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");

    match event_type {
        "checkout.session.completed" => {
            info!(session = object_id, "Payment succeeded for checkout session");
            state
                .event_sender
                .send_or_log(Event::PaymentSucceeded {
                    reference: object_id.to_string(),
                })
                .await;
        }
        "payment_intent.succeeded" => {
            info!(payment_intent = object_id, "Payment intent succeeded");
            state
                .event_sender
                .send_or_log(Event::PaymentSucceeded {
                    reference: object_id.to_string(),
                })
                .await;
        }
        "payment_intent.payment_failed" => {
            info!(payment_intent = object_id, "Payment failed");
            state
                .event_sender
                .send_or_log(Event::PaymentFailed {
                    reference: object_id.to_string(),
                })
                .await;
        }
        other => {
            info!("Unhandled webhook event type: {}", other);
        }
    }

    // No order record is updated here; the provider only needs the
    // acknowledgment.
    Ok(axum::Json(json!({ "received": true })))
}

/// Verifies the provider's `stripe-signature` header (`t=<ts>,v1=<hex>`)
/// against the raw payload: HMAC-SHA256 over `"{t}.{body}"` with the shared
/// secret, constant-time comparison, and a timestamp freshness window.
pub(crate) fn verify_signature(
    headers: &HeaderMap,
    payload: &Bytes,
    secret: &str,
    tolerance_secs: u64,
) -> bool {
    let Some(header) = headers
        .get("stripe-signature")
        .and_then(|h| h.to_str().ok())
    else {
        return false;
    };

    let mut timestamp = "";
    let mut v1 = "";
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value,
            Some(("v1", value)) => v1 = value,
            _ => {}
        }
    }
    if timestamp.is_empty() || v1.is_empty() {
        return false;
    }

    let Ok(ts) = timestamp.parse::<i64>() else {
        return false;
    };
    let now = chrono::Utc::now().timestamp();
    if (now - ts).unsigned_abs() > tolerance_secs {
        return false;
    }

    let Ok(payload_str) = std::str::from_utf8(payload) else {
        return false;
    };
    let signed = format!("{timestamp}.{payload_str}");
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(signed.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    constant_time_eq(&expected, v1)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
