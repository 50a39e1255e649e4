use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;

use cantina_api::{
    catalog::Catalog,
    config::AppConfig,
    domain::{CartLine, NutritionalInfo, Product},
    errors::ServiceError,
    events,
    services::{payments::PaymentGateway, AppServices},
    AppState,
};

/// One recorded call into the payment gateway port.
#[allow(dead_code)]
pub struct RecordedCall {
    pub items: Vec<CartLine>,
    pub success_url: String,
    pub cancel_url: String,
    pub payment_failed_url: Option<String>,
}

/// Gateway double that records calls instead of talking to the provider.
pub struct MockGateway {
    pub calls: Mutex<Vec<RecordedCall>>,
    fail: bool,
    redirect_url: String,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
            redirect_url: "https://pay.example/session/cs_test_123".to_string(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_checkout_session(
        &self,
        items: &[CartLine],
        success_url: &str,
        cancel_url: &str,
        payment_failed_url: Option<&str>,
    ) -> Result<String, ServiceError> {
        self.calls.lock().unwrap().push(RecordedCall {
            items: items.to_vec(),
            success_url: success_url.to_string(),
            cancel_url: cancel_url.to_string(),
            payment_failed_url: payment_failed_url.map(str::to_string),
        });

        if self.fail {
            Err(ServiceError::ExternalServiceError(
                "provider unavailable".to_string(),
            ))
        } else {
            Ok(self.redirect_url.clone())
        }
    }
}

pub fn sample_products() -> Vec<Product> {
    vec![
        Product {
            id: "tacos-al-pastor".into(),
            name: "Tacos al Pastor".into(),
            description: "Marinated pork, pineapple, cilantro".into(),
            price: dec!(28.50),
            image: "/images/tacos-al-pastor.webp".into(),
            category: "tacos".into(),
            tags: Some(vec!["Chef Recommends".into()]),
            nutritional_info: Some(NutritionalInfo {
                weight: "280g".into(),
                calories: "540 kcal".into(),
            }),
        },
        Product {
            id: "guacamole-totopos".into(),
            name: "Guacamole & Totopos".into(),
            description: "Avocado, lime, warm chips".into(),
            price: dec!(19.50),
            image: "/images/guacamole.webp".into(),
            category: "starters".into(),
            tags: None,
            nutritional_info: None,
        },
        Product {
            id: "horchata".into(),
            name: "Horchata".into(),
            description: "Rice and cinnamon drink".into(),
            price: dec!(9.00),
            image: "/images/horchata.webp".into(),
            category: "drinks".into(),
            tags: None,
            nutritional_info: None,
        },
    ]
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.stripe_webhook_secret = Some("whsec_test_secret".to_string());
    cfg
}

/// Harness wiring the real router to an in-memory catalog and a mock
/// payment gateway.
pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub state: Arc<AppState>,
    pub gateway: Arc<MockGateway>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(MockGateway::new(), test_config()).await
    }

    #[allow(dead_code)]
    pub async fn with_failing_gateway() -> Self {
        Self::build(MockGateway::failing(), test_config()).await
    }

    #[allow(dead_code)]
    pub async fn with_config(config: AppConfig) -> Self {
        Self::build(MockGateway::new(), config).await
    }

    async fn build(gateway: MockGateway, config: AppConfig) -> Self {
        let gateway = Arc::new(gateway);
        let catalog = Arc::new(Catalog::from_products(sample_products()));

        let (event_sender, event_rx) = events::channel(64);
        tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(
            event_sender.clone(),
            gateway.clone() as Arc<dyn PaymentGateway>,
            None,
        );

        let state = Arc::new(AppState {
            config,
            catalog,
            event_sender,
            services,
        });

        Self {
            router: cantina_api::app(state.clone()),
            state,
            gateway,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    /// Sends a raw body with the given headers, for webhook payloads where
    /// the exact byte sequence matters.
    #[allow(dead_code)]
    pub async fn post_raw(&self, uri: &str, body: &str, headers: &[(&str, &str)]) -> Response {
        let mut builder = Request::builder().method(Method::POST).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        self.router
            .clone()
            .oneshot(
                builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
