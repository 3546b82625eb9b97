pub mod check;
pub mod history;
pub mod info;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::MonitorError;

// ─── Unified error type ──────────────────────────────────────────

/// Failures of the checker itself. A down target is never one of these.
#[derive(Debug)]
pub enum AppError {
    Internal(String),
}

impl From<MonitorError> for AppError {
    fn from(err: MonitorError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        tracing::error!(status = status.as_u16(), error = %message, "request failed");

        let body = serde_json::json!({
            "error":  message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
