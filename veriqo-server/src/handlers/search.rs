//! Reverse image search handler
//!
//! Handles POST /api/search/upload requests.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Multipart, State},
    http::{header, Extensions, HeaderMap},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use veriqo_core::{Match, SearchRecord, SearchStatus, UploadDetails};

use crate::error::ApiError;
use crate::multipart::ImageUpload;
use crate::state::AppState;

/// Response for a reverse image search
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    /// Store-assigned id of the search, or "-1" if it was not persisted
    #[schema(example = "6650c1f2a4b5c6d7e8f90123")]
    pub id: String,
    /// Search status
    pub status: SearchStatus,
    /// Time spent matching, in milliseconds
    #[schema(example = 0)]
    pub duration_ms: u64,
    /// Platforms checked
    #[schema(example = json!(["Twitter", "Instagram", "Facebook", "Reddit", "LinkedIn"]))]
    pub platforms: Vec<String>,
    /// Matches found
    pub matches: Vec<Match>,
    /// Persistence failure, if any
    pub error: Option<String>,
}

impl SearchResponse {
    fn new(id: String, record: SearchRecord) -> Self {
        Self {
            id,
            status: record.status,
            duration_ms: record.duration_ms,
            platforms: record.platforms,
            matches: record.matches,
            error: record.error,
        }
    }
}

/// Peer address, present when the server was started with connect info
fn client_ip(extensions: &Extensions) -> Option<String> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Run a reverse image search for an uploaded image
///
/// Accepts multipart/form-data with:
/// - **file** (required): the image to search for; its Content-Type must be `image/*`
///
/// The search is recorded in the document store on a best-effort basis. If
/// the write fails the response still succeeds, with `id` set to `"-1"` and
/// `error` describing the failure.
#[utoipa::path(
    post,
    path = "/api/search/upload",
    tag = "Search",
    request_body(
        content_type = "multipart/form-data",
        description = "Image file in the 'file' field"
    ),
    responses(
        (status = 200, description = "Search completed", body = SearchResponse),
        (status = 400, description = "Missing file or not an image"),
        (status = 413, description = "File too large")
    )
)]
pub async fn search_upload_handler(
    State(state): State<AppState>,
    extensions: Extensions,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<SearchResponse>, ApiError> {
    let upload = ImageUpload::from_multipart(&mut multipart, state.config.max_file_size()).await?;

    let start = Instant::now();
    let matches = state.matcher.find_matches(upload.file_name.as_deref());
    let duration_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        filename = ?upload.file_name,
        content_type = %upload.content_type,
        size = upload.size(),
        matches = matches.len(),
        duration_ms,
        "Reverse image search completed"
    );

    let size = upload.size();
    let mut record = SearchRecord::completed_upload(
        UploadDetails {
            filename: upload.file_name,
            mime_type: Some(upload.content_type),
            size: Some(size),
            ip: client_ip(&extensions),
            user_agent: user_agent(&headers),
        },
        matches,
        duration_ms,
    );

    let outcome = state.persister.persist(&mut record).await;

    Ok(Json(SearchResponse::new(outcome.id, record)))
}
