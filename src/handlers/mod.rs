pub mod carts;
pub mod checkout;
pub mod common;
pub mod health;
pub mod products;
pub mod webhooks;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

/// Composes all `/api` routes.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health))
        .route("/products", get(products::list_products))
        .route("/checkout", post(checkout::create_checkout))
        .route("/webhooks", post(webhooks::payment_webhook))
        .route("/openapi.json", get(crate::openapi::openapi_json))
        .nest("/cart", carts::cart_routes())
}
