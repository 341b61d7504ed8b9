//! HTTP Route Tests
//!
//! Drives the axum router in-process with `tower::ServiceExt::oneshot`:
//! - success bodies are `{"result": ...}`
//! - failures are `{"error": ..., "code": ...}` with the mapped status

use std::io::{Cursor, Write};
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use insightdb::facade::InsightFacade;
use insightdb::http_server::{HttpServer, HttpServerConfig};
use insightdb::ingest::{GeoLocation, Geocoder, IngestError, IngestResult};
use insightdb::repository::MemoryRepository;
use serde_json::{json, Value};
use tower::ServiceExt;
use zip::write::FileOptions;
use zip::ZipWriter;

// =============================================================================
// Test Utilities
// =============================================================================

struct Offline;

impl Geocoder for Offline {
    async fn resolve(&self, address: &str) -> IngestResult<GeoLocation> {
        Err(IngestError::geocode(address, "offline"))
    }
}

fn router_with(config: HttpServerConfig) -> Router {
    let facade = Arc::new(InsightFacade::new(MemoryRepository::new(), Offline));
    HttpServer::with_config(config, facade).router()
}

fn router() -> Router {
    router_with(HttpServerConfig::default())
}

fn sections_zip() -> Vec<u8> {
    let body = json!({"result": [
        {"id": 11, "Course": "100", "Title": "intro", "Professor": "a", "Subject": "math",
         "Year": "2012", "Avg": 66.5, "Pass": 40, "Fail": 9, "Audit": 0},
        {"id": 12, "Course": "100", "Title": "intro", "Professor": "b", "Subject": "math",
         "Year": "2013", "Avg": 98.25, "Pass": 41, "Fail": 0, "Audit": 0}
    ]})
    .to_string();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    writer.add_directory("courses/", options).unwrap();
    writer.start_file("courses/MATH100", options).unwrap();
    writer.write_all(body.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

async fn send(router: &Router, method: Method, uri: &str, body: Vec<u8>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    // framework rejections (e.g. body limit) are plain text
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn put_sections(router: &Router, id: &str) -> (StatusCode, Value) {
    send(
        router,
        Method::PUT,
        &format!("/dataset/{}/sections", id),
        sections_zip(),
    )
    .await
}

// =============================================================================
// Success Paths
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&router(), Method::GET, "/health", Vec::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_put_list_query_delete() {
    let router = router();

    let (status, body) = put_sections(&router, "math").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"result": ["math"]}));

    let (status, body) = send(&router, Method::GET, "/datasets", Vec::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"result": [{"id": "math", "kind": "sections", "numRows": 2}]})
    );

    let query = json!({
        "WHERE": {"GT": {"math_avg": 97}},
        "OPTIONS": {"COLUMNS": ["math_instructor", "math_avg", "math_year"]}
    });
    let (status, body) = send(
        &router,
        Method::POST,
        "/query",
        serde_json::to_vec(&query).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"result": [{"math_instructor": "b", "math_avg": 98.25, "math_year": 2013}]})
    );

    let (status, body) = send(&router, Method::DELETE, "/dataset/math", Vec::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"result": "math"}));
}

// =============================================================================
// Error Mapping
// =============================================================================

#[tokio::test]
async fn test_validation_errors_are_400() {
    let router = router();

    let (status, body) = send(&router, Method::PUT, "/dataset/a_b/sections", sections_zip()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].as_str().is_some());

    let (status, body) = send(&router, Method::PUT, "/dataset/ok/planets", sections_zip()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(&router, Method::POST, "/query", b"{\"WHERE\":".to_vec()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    put_sections(&router, "math").await;
    let (status, body) = put_sections(&router, "math").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_dataset_delete_is_404() {
    let (status, body) = send(&router(), Method::DELETE, "/dataset/ghost", Vec::new()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let router = router_with(HttpServerConfig {
        max_body_bytes: 16,
        ..Default::default()
    });

    let (status, _) = put_sections(&router, "math").await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
