use axum::Json;
use utoipa::OpenApi;

use crate::{domain, errors, handlers, services};

/// OpenAPI document for the ordering API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cantina Ordering API",
        description = "Menu catalog, session carts, hosted-payment checkout and payment webhooks"
    ),
    paths(
        handlers::health::health,
        handlers::products::list_products,
        handlers::checkout::create_checkout,
        handlers::webhooks::payment_webhook,
        handlers::carts::create_cart,
        handlers::carts::get_cart,
        handlers::carts::add_to_cart,
        handlers::carts::update_cart_item,
        handlers::carts::remove_cart_item,
        handlers::carts::clear_cart,
    ),
    components(schemas(
        domain::Product,
        domain::NutritionalInfo,
        domain::CartLine,
        services::CartSnapshot,
        handlers::products::ProductsResponse,
        handlers::checkout::CheckoutRequest,
        handlers::checkout::CheckoutItemRequest,
        handlers::checkout::CheckoutProductRequest,
        handlers::checkout::CheckoutResponse,
        handlers::carts::CreateCartResponse,
        handlers::carts::AddItemRequest,
        handlers::carts::UpdateQuantityRequest,
        errors::ErrorResponse,
    )),
    tags(
        (name = "Catalog", description = "Read-only menu catalog"),
        (name = "Cart", description = "Session cart management"),
        (name = "Checkout", description = "Hosted payment session creation"),
        (name = "Webhooks", description = "Inbound payment provider events"),
        (name = "Health", description = "Service probes")
    )
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
