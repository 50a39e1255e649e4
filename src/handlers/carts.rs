use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response, validate_input,
    },
    AppState,
};

/// Creates the router for cart session endpoints
pub fn cart_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_cart))
        .route("/:session_id", get(get_cart))
        .route("/:session_id/items", post(add_to_cart))
        .route("/:session_id/items/:product_id", put(update_cart_item))
        .route("/:session_id/items/:product_id", delete(remove_cart_item))
        .route("/:session_id/clear", post(clear_cart))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateCartResponse {
    pub session_id: String,
}

/// Start a new cart session
#[utoipa::path(
    post,
    path = "/api/cart",
    responses((status = 201, description = "Cart session created", body = CreateCartResponse)),
    tag = "Cart"
)]
pub async fn create_cart(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = state.services.cart_sessions.create_session();
    Ok(created_response(CreateCartResponse { session_id }))
}

/// Get the current cart snapshot
#[utoipa::path(
    get,
    path = "/api/cart/{session_id}",
    responses(
        (status = 200, description = "Cart snapshot", body = crate::services::CartSnapshot),
        (status = 404, description = "Unknown session", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state
        .services
        .cart_sessions
        .snapshot(&session_id)
        .map_err(map_service_error)?;

    Ok(success_response(snapshot))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddItemRequest {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(range(min = 1))]
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Add a catalog product to the cart
#[utoipa::path(
    post,
    path = "/api/cart/{session_id}/items",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Updated cart snapshot", body = crate::services::CartSnapshot),
        (status = 404, description = "Unknown session or product", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let product = state
        .catalog
        .get(&payload.product_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("Product {} not found", payload.product_id)))?;

    let snapshot = state
        .services
        .cart_sessions
        .add_item(&session_id, product, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(snapshot))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateQuantityRequest {
    /// New quantity; 0 removes the line
    pub quantity: u32,
}

/// Set a cart line's quantity (0 removes the line)
#[utoipa::path(
    put,
    path = "/api/cart/{session_id}/items/{product_id}",
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Updated cart snapshot", body = crate::services::CartSnapshot),
        (status = 404, description = "Unknown session", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<Arc<AppState>>,
    Path((session_id, product_id)): Path<(String, String)>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state
        .services
        .cart_sessions
        .update_quantity(&session_id, &product_id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(snapshot))
}

/// Remove a line from the cart
#[utoipa::path(
    delete,
    path = "/api/cart/{session_id}/items/{product_id}",
    responses(
        (status = 204, description = "Line removed"),
        (status = 404, description = "Unknown session", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn remove_cart_item(
    State(state): State<Arc<AppState>>,
    Path((session_id, product_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .cart_sessions
        .remove_item(&session_id, &product_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Clear all lines from the cart
#[utoipa::path(
    post,
    path = "/api/cart/{session_id}/clear",
    responses(
        (status = 200, description = "Emptied cart snapshot", body = crate::services::CartSnapshot),
        (status = 404, description = "Unknown session", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state
        .services
        .cart_sessions
        .clear(&session_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(snapshot))
}
