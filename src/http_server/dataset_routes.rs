//! Dataset and Query HTTP Routes
//!
//! Thin mapping from requests to facade calls. Success bodies are
//! `{"result": ...}`; failures are `{"error": ..., "code": ...}`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::facade::{InsightError, InsightFacade};
use crate::ingest::Geocoder;
use crate::model::{DatasetKind, DatasetSummary, Record};
use crate::repository::DatasetRepository;

// ==================
// Response Types
// ==================

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ResultResponse<T> {
    pub result: T,
}

impl<T> ResultResponse<T> {
    fn json(result: T) -> Json<Self> {
        Json(Self { result })
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ==================
// Routes
// ==================

/// Health check route
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

/// Dataset and query routes over a shared facade
pub fn dataset_routes<R, G>(facade: Arc<InsightFacade<R, G>>) -> Router
where
    R: DatasetRepository + 'static,
    G: Geocoder + 'static,
{
    Router::new()
        .route("/datasets", get(list_datasets_handler::<R, G>))
        .route("/dataset/:id/:kind", put(add_dataset_handler::<R, G>))
        .route("/dataset/:id", delete(remove_dataset_handler::<R, G>))
        .route("/query", post(query_handler::<R, G>))
        .with_state(facade)
}

// ==================
// Handlers
// ==================

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

async fn list_datasets_handler<R, G>(
    State(facade): State<Arc<InsightFacade<R, G>>>,
) -> Result<Json<ResultResponse<Vec<DatasetSummary>>>, InsightError>
where
    R: DatasetRepository,
    G: Geocoder,
{
    Ok(ResultResponse::json(facade.list_datasets().await?))
}

async fn add_dataset_handler<R, G>(
    State(facade): State<Arc<InsightFacade<R, G>>>,
    Path((id, kind)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<ResultResponse<Vec<String>>>, InsightError>
where
    R: DatasetRepository,
    G: Geocoder,
{
    let kind: DatasetKind = kind.parse().map_err(InsightError::Validation)?;
    let ids = facade.add_dataset_archive(&id, &body, kind).await?;
    Ok(ResultResponse::json(ids))
}

async fn remove_dataset_handler<R, G>(
    State(facade): State<Arc<InsightFacade<R, G>>>,
    Path(id): Path<String>,
) -> Result<Json<ResultResponse<String>>, InsightError>
where
    R: DatasetRepository,
    G: Geocoder,
{
    Ok(ResultResponse::json(facade.remove_dataset(&id).await?))
}

async fn query_handler<R, G>(
    State(facade): State<Arc<InsightFacade<R, G>>>,
    body: Bytes,
) -> Result<Json<ResultResponse<Vec<Record>>>, InsightError>
where
    R: DatasetRepository,
    G: Geocoder,
{
    let query: Value = serde_json::from_slice(&body)
        .map_err(|e| InsightError::validation(format!("Query is not valid JSON: {}", e)))?;
    Ok(ResultResponse::json(facade.perform_query(&query).await?))
}
