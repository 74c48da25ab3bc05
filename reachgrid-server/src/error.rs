use std::path::PathBuf;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reachgrid_core::Error;
use serde::Serialize;

/// Failures while reading configuration and binding data at startup
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Core(#[from] Error),
}

/// Request failure rendered as `{"error": "..."}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] Error),
    #[error("Analysis task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Engine(e) if e.is_lookup() => StatusCode::NOT_FOUND,
            ApiError::Engine(
                Error::InvalidThreshold(_)
                | Error::EmptyIndex
                | Error::ZeroPopulation
                | Error::ZeroService,
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Engine(Error::InvalidData(_)) => StatusCode::BAD_REQUEST,
            ApiError::Engine(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
