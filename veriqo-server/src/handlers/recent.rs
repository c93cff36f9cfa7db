//! Recent searches handler
//!
//! Handles GET /api/search/recent requests.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::state::AppState;
use crate::store::StoredSearch;

/// Default number of searches returned
const DEFAULT_LIMIT: i64 = 5;

/// Upper bound on `limit`
const MAX_LIMIT: i64 = 100;

/// Query parameters for the recent searches listing
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    /// Maximum number of searches (default: 5, clamped to 1..=100)
    #[param(example = 5)]
    pub limit: Option<i64>,
}

impl RecentQuery {
    fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize
    }
}

/// Recent searches response
#[derive(Serialize, ToSchema)]
pub struct RecentResponse {
    /// Stored searches, newest first
    pub items: Vec<StoredSearch>,
}

/// List the most recent searches
///
/// Returns an empty list, not an error, when the document store is
/// unavailable.
#[utoipa::path(
    get,
    path = "/api/search/recent",
    tag = "Search",
    params(RecentQuery),
    responses(
        (status = 200, description = "Recent searches, newest first", body = RecentResponse),
        (status = 400, description = "Invalid limit parameter")
    )
)]
pub async fn recent_searches_handler(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Json<RecentResponse> {
    let items = state.persister.recent(query.effective_limit()).await;
    Json(RecentResponse { items })
}
