use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{domain::Product, errors::ApiError, handlers::common::success_response, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductsQuery {
    /// Restrict the listing to one menu category
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

/// List catalog products, optionally filtered by category.
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductsQuery),
    responses(
        (status = 200, description = "Catalog products", body = ProductsResponse),
        (status = 405, description = "Method not allowed", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = match query.category.as_deref() {
        Some(category) => state.catalog.by_category(category),
        None => state.catalog.all().to_vec(),
    };

    Ok(success_response(ProductsResponse { products }))
}
