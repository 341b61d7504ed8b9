//! # insightdb HTTP Server Module
//!
//! Axum front end over the insight facade.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /datasets` - List datasets
//! - `PUT /dataset/:id/:kind` - Add a dataset from a raw zip body
//! - `DELETE /dataset/:id` - Remove a dataset
//! - `POST /query` - Run a query document

pub mod config;
pub mod dataset_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use dataset_routes::{dataset_routes, health_routes, HealthResponse, ResultResponse};
pub use server::HttpServer;
