//! Error types for the search store module.

use thiserror::Error;

/// Errors that can occur when interacting with a search store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Store not configured or unreachable
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// Operation did not complete within the configured timeout
    #[error("Database operation timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    /// Store rejected the document
    #[error("Document validation failed: {0}")]
    ValidationFailed(String),

    /// Any other driver or query failure
    #[error("Query error: {0}")]
    Query(String),
}

impl StoreError {
    /// Whether a retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout { .. })
    }

    /// Label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Timeout { .. } => "timeout",
            Self::ValidationFailed(_) => "validation_failed",
            Self::Query(_) => "query",
        }
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        // MongoDB server code for DocumentValidationFailure
        const DOCUMENT_VALIDATION_FAILURE: i32 = 121;

        match e.kind.as_ref() {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. }
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::Authentication { .. } => Self::Unavailable(e.to_string()),
            ErrorKind::Write(WriteFailure::WriteError(write))
                if write.code == DOCUMENT_VALIDATION_FAILURE =>
            {
                Self::ValidationFailed(e.to_string())
            }
            ErrorKind::BsonSerialization(_) | ErrorKind::InvalidArgument { .. } => {
                Self::ValidationFailed(e.to_string())
            }
            _ => Self::Query(e.to_string()),
        }
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        Self::ValidationFailed(e.to_string())
    }
}
