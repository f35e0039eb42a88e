/*
 * Responsibility
 * - App-wide AppError definition
 * - IntoResponse impl (HTTP status / JSON error body)
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Terminal outcome of a rejected request.
///
/// The gate never lets a failure escape as anything but one of these; the
/// response body shape (`{"error": ..., "message": ...}`) is part of the
/// gateway's public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Internal(&'static str),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: &'static str,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (error, message) = match self {
            AppError::Unauthorized(message) => ("Unauthorized", message),
            AppError::Internal(message) => ("Internal Server Error", message),
        };

        (self.status(), Json(ErrorBody { error, message })).into_response()
    }
}
