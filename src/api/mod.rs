//! REST API server for StatusHD.
//!
//! Provides HTTP endpoints for:
//! - Service descriptor (GET /)
//! - Health check (GET /health)
//! - Video conversion (POST /convert)

pub mod error;
pub mod routes;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Settings;

/// Immutable per-process context injected into every handler.
///
/// The transcoder path is resolved and probed exactly once at startup;
/// handlers read the result instead of re-probing per request.
#[derive(Clone)]
pub struct ServiceState {
    inner: Arc<StateInner>,
}

struct StateInner {
    settings: Settings,
    transcoder: Option<PathBuf>,
}

impl ServiceState {
    pub fn new(settings: Settings, transcoder: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(StateInner {
                settings,
                transcoder,
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Probed transcoder binary, when the startup probe succeeded.
    pub fn transcoder(&self) -> Option<&Path> {
        self.inner.transcoder.as_deref()
    }

    pub fn transcoder_available(&self) -> bool {
        self.inner.transcoder.is_some()
    }
}

pub struct ApiServer {
    state: ServiceState,
}

impl ApiServer {
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }

    /// Build the router. Separate from `start` so tests can drive it
    /// in-process.
    pub fn router(state: ServiceState) -> Router {
        Router::new()
            .route("/", get(routes::info::index))
            .route("/health", get(routes::info::health))
            .route("/convert", post(routes::convert::convert_video))
            .layer(
                ServiceBuilder::new()
                    // The size cap is enforced after the upload is persisted,
                    // so the transport-level multipart body limit is lifted.
                    .layer(DefaultBodyLimit::disable())
                    // Permissive CORS so the API is callable from shortcuts
                    // and browser clients on any origin.
                    .layer(
                        CorsLayer::new()
                            .allow_origin(Any)
                            .allow_methods(Any)
                            .allow_headers(Any),
                    ),
            )
            .with_state(state)
    }

    pub async fn start(self) -> Result<()> {
        let port = self.state.settings().port;
        let app = Self::router(self.state);

        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

        info!("API server listening on http://0.0.0.0:{}", port);
        info!("Endpoints:");
        info!("  GET  /         - Service descriptor");
        info!("  GET  /health   - Health check");
        info!("  POST /convert  - Upload video for conversion");

        axum::serve(listener, app).await?;

        Ok(())
    }
}
