//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.
//! Store failures never reach this type: they are absorbed by the persister.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found - no route or resource matches the request
    #[error("Not found: {0}")]
    NotFound(String),

    /// Payload too large - upload exceeds the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a payload too large error
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::PayloadTooLarge(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
        }
    }

    /// Message shown to the client, without the category prefix
    fn client_message(&self) -> &str {
        match self {
            Self::BadRequest(m) | Self::NotFound(m) | Self::PayloadTooLarge(m) => m,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        tracing::warn!(
            status = %status,
            code = code,
            error = %self,
            "Client error"
        );

        let body = serde_json::json!({
            "error": self.client_message(),
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
