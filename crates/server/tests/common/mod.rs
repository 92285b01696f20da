//! Common test utilities for in-process API testing.
//!
//! The fixture wires the real router, orchestrator, job store and history
//! writer around a `MockBackend`, so requests go through the full stack
//! without ffmpeg or any other converter installed.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use fileforge_core::{
    create_history_system, testing::MockBackend, BatchOrchestrator, Config, HistorySink,
    JobStore, MemoryHistory, RetentionControl,
};
use fileforge_server::{create_router, AppState, WsBroadcaster};

/// Re-export fixtures for test convenience
pub use fileforge_core::testing::fixtures;

const BOUNDARY: &str = "fileforge-test-boundary";

/// Test fixture for API testing with a mock backend.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_convert() {
///     let fixture = TestFixture::new();
///     let response = fixture
///         .post_multipart("/api/v1/convert", &[
///             Part::file("a.png", fixtures::PNG_BYTES),
///             Part::text("output_format", "jpg"),
///         ])
///         .await;
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock backend installed for every format family
    pub backend: Arc<MockBackend>,
    pub store: JobStore,
    pub history: Arc<MemoryHistory>,
    pub retention: RetentionControl,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Response with the body left as bytes
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// One part of a multipart form.
pub enum Part {
    File { name: String, data: Vec<u8> },
    Text { name: String, value: String },
}

impl Part {
    pub fn file(file_name: &str, data: &[u8]) -> Self {
        Part::File {
            name: file_name.to_string(),
            data: data.to_vec(),
        }
    }

    pub fn text(name: &str, value: &str) -> Self {
        Part::Text {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File { name, data } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\r\n",
                        name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                        name, value
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

impl TestFixture {
    /// Create a new test fixture with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a test fixture with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let backend = Arc::new(MockBackend::new());

        let history = Arc::new(MemoryHistory::new(config.history.capacity));
        let (history_handle, history_writer) = create_history_system(
            Arc::clone(&history) as Arc<dyn HistorySink>,
            config.history.buffer_size,
        );
        tokio::spawn(history_writer.run());

        let store = JobStore::new();
        let orchestrator = Arc::new(BatchOrchestrator::new(
            config.orchestrator(),
            store.clone(),
            fixtures::router(backend.clone()),
            Some(history_handle),
        ));

        let retention = RetentionControl::new(config.retention_settings());
        let ws_broadcaster = WsBroadcaster::default();
        ws_broadcaster.forward_job_events(store.events());

        let state = Arc::new(AppState::new(
            config,
            orchestrator,
            retention.clone(),
            Arc::clone(&history) as Arc<dyn HistorySink>,
            ws_broadcaster,
        ));

        Self {
            router: create_router(state),
            backend,
            store,
            history,
            retention,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a multipart form.
    pub async fn post_multipart(&self, path: &str, parts: &[Part]) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        into_test_response(self.send(request).await).await
    }

    /// Send a GET request and keep the body as bytes.
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = self.send(request).await;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        RawResponse {
            status,
            headers,
            body,
        }
    }

    /// Polls a job until it is completed or failed.
    pub async fn wait_for_job(&self, id: &str) -> Value {
        for _ in 0..200 {
            let response = self.get(&format!("/api/v1/jobs/{}", id)).await;
            let status = response.body["status"].as_str().unwrap_or_default();
            if status == "completed" || status == "failed" {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish in time", id);
    }

    /// Waits until no job is queued or processing and no batch is running.
    pub async fn wait_until_idle(&self) {
        for _ in 0..200 {
            let status = self.get("/api/v1/batch/status").await;
            if status.body["in_progress"] == false && status.body["pending_jobs"] == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("jobs did not settle in time");
    }

    async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        into_test_response(self.send(request).await).await
    }
}

async fn into_test_response(response: axum::response::Response) -> TestResponse {
    let status = response.status();
    let body_bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect body")
        .to_bytes();

    let body: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    TestResponse { status, body }
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
