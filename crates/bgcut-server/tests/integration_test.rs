//! End-to-end integration tests for the bgcut HTTP API.
//!
//! Tests exercise the full stack: HTTP request -> axum router -> handler ->
//! remover -> HTTP response. The segmentation engine is replaced with stubs
//! so tests stay fast and weight-free; engine behavior is covered by the
//! bgcut-model unit tests.
//!
//! Requests go through `tower::ServiceExt::oneshot` directly against the
//! router, without starting a network server.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::json;
use tower::ServiceExt;

use bgcut_model::{BackgroundRemover, ModelError};
use bgcut_server::router::build_router;
use bgcut_server::state::AppState;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

const MAX_UPLOAD: usize = 2 * 1024 * 1024;
const BOUNDARY: &str = "bgcut-test-boundary";

/// Remover returning canned bytes, standing in for the real engine.
struct StubRemover;

impl BackgroundRemover for StubRemover {
    fn remove(&self, _image: &[u8]) -> Result<Vec<u8>, ModelError> {
        Ok(b"stub-png-bytes".to_vec())
    }
}

/// Remover that always fails the way a broken engine would.
struct FailingRemover;

impl BackgroundRemover for FailingRemover {
    fn remove(&self, _image: &[u8]) -> Result<Vec<u8>, ModelError> {
        Err(ModelError::internal("engine exploded"))
    }
}

/// Remover that rejects its input as undecodable.
struct RejectingRemover;

impl BackgroundRemover for RejectingRemover {
    fn remove(&self, _image: &[u8]) -> Result<Vec<u8>, ModelError> {
        Err(ModelError::invalid_image("not an image"))
    }
}

/// Creates a router around the given remover.
fn test_app(remover: Arc<dyn BackgroundRemover>) -> Router {
    build_router(AppState::with_remover(remover, MAX_UPLOAD))
}

/// Builds a single-part multipart body.
fn multipart_body(field_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field_name}\"; filename=\"photo\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Sends a multipart POST to /remove.
async fn post_remove(app: &Router, body: Vec<u8>) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/remove")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(json!(null))
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

// ---------------------------------------------------------------------------
// /health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_ok() {
    let app = test_app(Arc::new(StubRemover));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

// ---------------------------------------------------------------------------
// /remove
// ---------------------------------------------------------------------------

#[tokio::test]
async fn remove_streams_png_with_disposition() {
    let app = test_app(Arc::new(StubRemover));
    let response = post_remove(&app, multipart_body("file", "image/png", b"fake png")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("inline; filename=\""));
    assert!(disposition.ends_with(".png\""));

    assert_eq!(body_bytes(response).await, b"stub-png-bytes");
}

#[tokio::test]
async fn remove_accepts_jpeg_uploads() {
    let app = test_app(Arc::new(StubRemover));
    let response = post_remove(&app, multipart_body("file", "image/jpeg", b"fake jpeg")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn remove_rejects_unsupported_content_type() {
    let app = test_app(Arc::new(StubRemover));
    let response = post_remove(&app, multipart_body("file", "text/plain", b"hello")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("BAD_REQUEST"));
    assert_eq!(
        body["error"]["message"],
        json!("Only PNG and JPEG files are supported.")
    );
}

#[tokio::test]
async fn remove_rejects_oversize_upload() {
    let app = test_app(Arc::new(StubRemover));
    let oversize = vec![0u8; MAX_UPLOAD + 1];
    let response = post_remove(&app, multipart_body("file", "image/png", &oversize)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("File too large"));
}

#[tokio::test]
async fn remove_rejects_empty_upload() {
    let app = test_app(Arc::new(StubRemover));
    let response = post_remove(&app, multipart_body("file", "image/png", b"")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn remove_requires_file_part() {
    let app = test_app(Arc::new(StubRemover));
    let response = post_remove(&app, multipart_body("attachment", "image/png", b"fake")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("\"file\""));
}

#[tokio::test]
async fn remove_rejects_non_multipart_request() {
    let app = test_app(Arc::new(StubRemover));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/remove")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn undecodable_image_maps_to_bad_request() {
    let app = test_app(Arc::new(RejectingRemover));
    let response = post_remove(&app, multipart_body("file", "image/png", b"garbage")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("invalid image"));
}

#[tokio::test]
async fn engine_failure_maps_to_internal_error() {
    let app = test_app(Arc::new(FailingRemover));
    let response = post_remove(&app, multipart_body("file", "image/png", b"fake png")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("INTERNAL_ERROR"));
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Background removal failed"));
}
