//! Service descriptor and health endpoints.

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::api::ServiceState;
use crate::config;

/// GET / - Service descriptor with usage hints for clients.
pub async fn index(State(state): State<ServiceState>) -> Json<Value> {
    Json(json!({
        "status": "online",
        "service": "StatusHD Video Converter API",
        "version": env!("CARGO_PKG_VERSION"),
        "ffmpeg_available": state.transcoder_available(),
        "endpoints": {
            "/convert": "POST - Upload video for conversion",
            "/health": "GET - Check API health"
        },
        "usage": {
            "method": "POST",
            "endpoint": "/convert",
            "content_type": "multipart/form-data",
            "field_name": config::UPLOAD_FIELD,
            "max_size": "100MB",
            "supported_formats": config::ALLOWED_EXTENSIONS,
            "output": "Optimized MP4 file"
        }
    }))
}

/// GET /health - Liveness check reporting transcoder availability.
pub async fn health(State(state): State<ServiceState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Local::now().to_rfc3339(),
        "ffmpeg_available": state.transcoder_available(),
    }))
}
