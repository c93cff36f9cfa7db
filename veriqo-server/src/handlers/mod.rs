//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod diagnostics;
pub mod health;
pub mod recent;
pub mod search;

pub use crate::state::AppState;
pub use diagnostics::{diagnostics_handler, DiagnosticsResponse};
pub use health::{hello, root, MessageResponse};
pub use recent::{recent_searches_handler, RecentQuery, RecentResponse};
pub use search::{search_upload_handler, SearchResponse};

use crate::error::ApiError;

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("No route matches this request")
}
