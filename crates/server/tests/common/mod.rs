//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock data service injected, enabling E2E testing without a real
//! gateway.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use filmcat_core::{
    testing::MockDataService, CatalogView, Config, DataServiceConfig, ServerConfig, ViewConfig,
};
use filmcat_server::state::AppState;

/// Re-export fixtures for test convenience
pub use filmcat_core::testing::fixtures;

/// Test fixture for E2E testing with a mock data service.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_search() {
///     let fixture = TestFixture::with_films(fixtures::dune_and_clue()).await;
///
///     let response = fixture.get("/api/v1/films?search=du").await;
///
///     assert_eq!(response.body["state"], "populated");
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock data service - configure films and failures
    pub service: MockDataService,
    /// Shared state, for driving the view directly
    pub state: Arc<AppState>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Response with a raw text body
#[derive(Debug)]
pub struct TextResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: String,
}

impl TestFixture {
    /// Create a fixture whose view is not mounted yet.
    pub fn unmounted(service: MockDataService) -> Self {
        let config = test_config();
        let view = CatalogView::new(Arc::new(service.clone()), &config.view);
        let state = Arc::new(AppState::new(config, view));
        let router = filmcat_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            service,
            state,
        }
    }

    /// Create a fixture serving `films` with the initial fetch completed.
    pub async fn with_films(films: Vec<filmcat_core::FilmRecord>) -> Self {
        Self::mounted(MockDataService::with_films(films)).await
    }

    /// Mount the view over `service` and wait for the initial fetch.
    pub async fn mounted(service: MockDataService) -> Self {
        let fixture = Self::unmounted(service);
        let fetch = fixture.state.view().write().await.mount();
        let _ = fetch.await;
        fixture
    }

    /// Send a GET request and parse the body as JSON.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    /// Send a GET request and keep the body as text.
    pub async fn get_text(&self, path: &str) -> TextResponse {
        let (status, content_type, bytes) = self.send("GET", path).await;
        TextResponse {
            status,
            content_type,
            body: String::from_utf8(bytes).expect("Body is not UTF-8"),
        }
    }

    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let (status, _, bytes) = self.send(method, path).await;

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    async fn send(&self, method: &str, path: &str) -> (StatusCode, String, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, content_type, body_bytes.to_vec())
    }
}

fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            port: 0, // Not used for in-process testing
        },
        data_service: DataServiceConfig {
            url: "http://gateway.invalid".to_string(),
            api_key: "anon-key".to_string(),
            table: "films".to_string(),
            timeout_secs: 5,
        },
        view: ViewConfig::default(),
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
