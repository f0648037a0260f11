//! Error taxonomy for the conversion pipeline, with consistent JSON
//! error responses.
//!
//! Every failure a request can hit maps to one structured `{"error": ...}`
//! body; nothing propagates out of a handler unconverted.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// Multipart form carried no upload field.
    #[error("No video file provided")]
    MissingFile,
    /// The upload field carried no filename.
    #[error("No file selected")]
    EmptyFilename,
    /// Filename extension is not in the allow-list.
    #[error("Invalid file format")]
    UnsupportedFormat,
    #[error("File too large. Max size: {}MB", config::MAX_FILE_SIZE / 1024 / 1024)]
    PayloadTooLarge,
    /// Stored upload was missing or empty after the write.
    #[error("Invalid video file: {0}")]
    InvalidMedia(String),
    /// The startup probe never found a working transcoder.
    #[error("FFmpeg is not installed or not accessible on the server. Please contact the administrator.")]
    ServiceUnavailable,
    /// ffmpeg exited non-zero; carries its diagnostic text.
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),
    /// Anything not already mapped to a structured error.
    #[error("Server error: {0}")]
    Internal(String),
}

impl ConvertError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFile
            | Self::EmptyFilename
            | Self::UnsupportedFormat
            | Self::PayloadTooLarge
            | Self::InvalidMedia(_) => StatusCode::BAD_REQUEST,
            Self::ServiceUnavailable | Self::ConversionFailed(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::UnsupportedFormat => json!({
                "error": self.to_string(),
                "supported_formats": config::ALLOWED_EXTENSIONS,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<MultipartError> for ConvertError {
    fn from(err: MultipartError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<std::io::Error> for ConvertError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<anyhow::Error> for ConvertError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type for conversion handlers.
pub type ConvertResult<T> = Result<T, ConvertError>;
