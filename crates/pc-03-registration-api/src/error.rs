//! Registration API errors and their HTTP mapping
//!
//! Every error is rendered as `{"error": {"message": ..}}`. Client errors are
//! `400`, except a body over the configured limit, which is `413`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Body is not JSON or lacks a required field
    #[error("{0}")]
    MalformedRequest(String),

    /// Body longer than `max_body_bytes`
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    /// No route for this path and method
    #[error("Unknown path")]
    UnknownPath,

    /// Route configuration rejected at startup
    #[error("Invalid registration config: {0}")]
    Config(String),

    /// Listener could not be bound or failed while serving
    #[error("Server error: {0}")]
    Server(String),

    #[error("Metrics unavailable: {0}")]
    Metrics(String),
}

impl RegistrationError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) | Self::UnknownPath => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Config(_) | Self::Server(_) | Self::Metrics(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RegistrationError {
    fn into_response(self) -> Response {
        let body = json!({ "error": { "message": self.to_string() } });
        (self.status(), Json(body)).into_response()
    }
}
