//! Store diagnostic handler
//!
//! Handles GET /test. Reports whether the document store is configured and
//! reachable without ever failing the request.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Maximum characters of a store error echoed to the client
const MAX_ERROR_CHARS: usize = 80;

/// Diagnostic response
#[derive(Debug, Serialize, ToSchema)]
pub struct DiagnosticsResponse {
    /// Backend status
    #[schema(example = "running")]
    pub backend: String,
    /// Store status, including a truncated error if the store failed
    #[schema(example = "connected")]
    pub database: String,
    /// Whether DATABASE_URL is set (the value is never reported)
    #[schema(example = "set")]
    pub database_url: String,
    /// Whether DATABASE_NAME is set (the value is never reported)
    #[schema(example = "set")]
    pub database_name: String,
    /// "Connected" or "Not Connected"
    #[schema(example = "Connected")]
    pub connection_status: String,
    /// Up to ten collection names
    pub collections: Vec<String>,
}

fn presence(value: Option<&str>) -> String {
    if value.is_some() { "set" } else { "not set" }.to_string()
}

fn truncate(message: &str) -> String {
    message.chars().take(MAX_ERROR_CHARS).collect()
}

/// Report store connectivity
#[utoipa::path(
    get,
    path = "/test",
    tag = "Health",
    responses((status = 200, description = "Store diagnostics", body = DiagnosticsResponse))
)]
pub async fn diagnostics_handler(State(state): State<AppState>) -> Json<DiagnosticsResponse> {
    let mut response = DiagnosticsResponse {
        backend: "running".to_string(),
        database: "not configured".to_string(),
        database_url: presence(state.config.database_url.as_deref()),
        database_name: presence(state.config.database_name.as_deref()),
        connection_status: "Not Connected".to_string(),
        collections: Vec::new(),
    };

    if !state.persister.is_connected() {
        return Json(response);
    }

    match state.persister.diagnostics().await {
        Ok(diagnostics) => {
            response.database = format!("connected ({})", diagnostics.database);
            response.connection_status = "Connected".to_string();
            response.collections = diagnostics.collections;
        }
        Err(e) => {
            tracing::warn!(kind = e.kind(), error = %e, "Store diagnostics failed");
            response.database = format!("error: {}", truncate(&e.to_string()));
        }
    }

    Json(response)
}
