//! Route errors rendered as `{"error": "..."}` JSON bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The monitor is still being constructed; no snapshot can be served.
    #[error("Monitor not initialized")]
    NotInitialized,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotInitialized => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}
