//! Cantina ordering API
//!
//! Backend for the restaurant site: read-only menu catalog, session-scoped
//! shopping carts, a checkout flow that hands off to a hosted payment
//! provider, and the provider's signed webhook callback.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod notifications;
pub mod openapi;
pub mod services;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{catalog::Catalog, config::AppConfig, events::EventSender, services::AppServices};

/// Shared application state, constructed once at startup and passed to
/// request handlers explicitly.
pub struct AppState {
    pub config: AppConfig,
    pub catalog: Arc<Catalog>,
    pub event_sender: EventSender,
    pub services: AppServices,
}

/// Builds the application router with tracing and CORS layers applied.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .nest("/api", handlers::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    match &config.cors_allowed_origins {
        Some(origins) => {
            let list: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(list))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}
