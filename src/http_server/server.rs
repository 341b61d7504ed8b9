//! # HTTP Server
//!
//! Combines the health and dataset routers behind CORS, tracing and a
//! request-body limit.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::facade::InsightFacade;
use crate::ingest::Geocoder;
use crate::repository::DatasetRepository;

use super::config::HttpServerConfig;
use super::dataset_routes::{dataset_routes, health_routes};

/// HTTP server over one facade
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with custom configuration
    pub fn with_config<R, G>(config: HttpServerConfig, facade: Arc<InsightFacade<R, G>>) -> Self
    where
        R: DatasetRepository + 'static,
        G: Geocoder + 'static,
    {
        let router = Self::build_router(&config, facade);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    fn build_router<R, G>(config: &HttpServerConfig, facade: Arc<InsightFacade<R, G>>) -> Router
    where
        R: DatasetRepository + 'static,
        G: Geocoder + 'static,
    {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes())
            .merge(dataset_routes(facade))
            .layer(DefaultBodyLimit::max(config.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serves until ctrl-c
    pub async fn start(self) -> io::Result<()> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "insightdb HTTP server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("insightdb HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
