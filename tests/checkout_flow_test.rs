//! End-to-end tests for the HTTP surface: catalog listing, the cart session
//! endpoints, and the checkout endpoint's boundary validation and gateway
//! hand-off.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::json;

fn valid_items() -> serde_json::Value {
    json!([
        {
            "product": {
                "id": "tacos-al-pastor",
                "name": "Tacos al Pastor",
                "description": "Marinated pork, pineapple, cilantro",
                "price": 28.50,
                "image": "/images/tacos-al-pastor.webp"
            },
            "quantity": 2
        },
        {
            "product": {
                "id": "horchata",
                "name": "Horchata",
                "price": 9.00,
                "image": "/images/horchata.webp"
            },
            "quantity": 1
        }
    ])
}

// ==================== Checkout ====================

#[tokio::test]
async fn checkout_returns_redirect_url_from_gateway() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/checkout",
            Some(json!({ "items": valid_items() })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(
        body["checkoutUrl"],
        "https://pay.example/session/cs_test_123"
    );

    let calls = app.gateway.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].items.len(), 2);
    assert_eq!(calls[0].items[0].product.id, "tacos-al-pastor");
    assert_eq!(calls[0].items[0].quantity, 2);
}

#[tokio::test]
async fn checkout_derives_callback_urls_from_host_header() {
    let app = TestApp::new().await;

    let response = app
        .request_with_headers(
            Method::POST,
            "/api/checkout",
            Some(json!({ "items": valid_items() })),
            &[("host", "cantina.example")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let calls = app.gateway.calls.lock().unwrap();
    assert_eq!(calls[0].success_url, "http://cantina.example/thanks");
    assert_eq!(calls[0].cancel_url, "http://cantina.example/cart");
    assert_eq!(
        calls[0].payment_failed_url.as_deref(),
        Some("http://cantina.example/payment-failed")
    );
}

#[tokio::test]
async fn checkout_honors_forwarded_proxy_headers() {
    let app = TestApp::new().await;

    let response = app
        .request_with_headers(
            Method::POST,
            "/api/checkout",
            Some(json!({ "items": valid_items() })),
            &[
                ("host", "internal:8080"),
                ("x-forwarded-host", "cantina.example"),
                ("x-forwarded-proto", "https"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let calls = app.gateway.calls.lock().unwrap();
    assert_eq!(calls[0].success_url, "https://cantina.example/thanks");
}

#[tokio::test]
async fn checkout_rejects_empty_items_before_the_gateway() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/api/checkout", Some(json!({ "items": [] })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The adapter must never see an empty array.
    assert_eq!(app.gateway.call_count(), 0);
}

#[tokio::test]
async fn checkout_rejects_missing_or_non_array_items() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/api/checkout", Some(json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::POST,
            "/api/checkout",
            Some(json!({ "items": "not-an-array" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.gateway.call_count(), 0);
}

#[tokio::test]
async fn checkout_rejects_non_positive_quantities() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/checkout",
            Some(json!({
                "items": [{
                    "product": { "id": "horchata", "name": "Horchata", "price": 9.00 },
                    "quantity": 0
                }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.gateway.call_count(), 0);
}

#[tokio::test]
async fn checkout_rejects_malformed_product_fields() {
    let app = TestApp::new().await;

    // Empty product id
    let response = app
        .request(
            Method::POST,
            "/api/checkout",
            Some(json!({
                "items": [{
                    "product": { "id": "", "name": "Horchata", "price": 9.00 },
                    "quantity": 1
                }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Negative price
    let response = app
        .request(
            Method::POST,
            "/api/checkout",
            Some(json!({
                "items": [{
                    "product": { "id": "horchata", "name": "Horchata", "price": -1.00 },
                    "quantity": 1
                }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.gateway.call_count(), 0);
}

#[tokio::test]
async fn checkout_surfaces_gateway_failures_as_generic_500() {
    let app = TestApp::with_failing_gateway().await;

    let response = app
        .request(
            Method::POST,
            "/api/checkout",
            Some(json!({ "items": valid_items() })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = response_json(response).await;
    assert_eq!(body["message"], "Internal server error");
}

#[tokio::test]
async fn checkout_rejects_wrong_method() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/checkout", None).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ==================== Catalog ====================

#[tokio::test]
async fn products_lists_the_full_catalog() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/products", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(products[0]["id"], "tacos-al-pastor");
    assert_eq!(products[0]["nutritionalInfo"]["weight"], "280g");
}

#[tokio::test]
async fn products_filters_by_category() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/products?category=drinks", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], "horchata");

    let response = app
        .request(Method::GET, "/api/products?category=desserts", None)
        .await;
    let body = response_json(response).await;
    assert!(body["products"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn products_rejects_wrong_method() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/api/products", Some(json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ==================== Cart over HTTP ====================

#[tokio::test]
async fn cart_flow_over_http() {
    let app = TestApp::new().await;

    // Create a session
    let response = app.request(Method::POST, "/api/cart", None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let session_id = body["session_id"].as_str().unwrap().to_string();

    // Add two lines
    let response = app
        .request(
            Method::POST,
            &format!("/api/cart/{session_id}/items"),
            Some(json!({ "product_id": "tacos-al-pastor", "quantity": 2 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            &format!("/api/cart/{session_id}/items"),
            Some(json!({ "product_id": "horchata" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["lines"].as_array().unwrap().len(), 2);
    assert_eq!(body["total"], "66.00");

    // Setting quantity to zero removes the line
    let response = app
        .request(
            Method::PUT,
            &format!("/api/cart/{session_id}/items/horchata"),
            Some(json!({ "quantity": 0 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["lines"].as_array().unwrap().len(), 1);

    // Delete the remaining line
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/cart/{session_id}/items/tacos-al-pastor"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(Method::GET, &format!("/api/cart/{session_id}"), None)
        .await;
    let body = response_json(response).await;
    assert!(body["lines"].as_array().unwrap().is_empty());
    assert_eq!(body["total"], "0");
}

#[tokio::test]
async fn cart_add_rejects_unknown_product() {
    let app = TestApp::new().await;

    let response = app.request(Method::POST, "/api/cart", None).await;
    let body = response_json(response).await;
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            &format!("/api/cart/{session_id}/items"),
            Some(json!({ "product_id": "no-such-dish" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cart_operations_on_unknown_session_return_404() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/cart/not-a-session", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ==================== Health ====================

#[tokio::test]
async fn health_endpoint_responds() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
}
