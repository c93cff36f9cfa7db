//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3.0 specification for the Veriqo API.

use utoipa::OpenApi;
use veriqo_core::{Match, QueryType, SearchRecord, SearchStatus};

use crate::handlers::{DiagnosticsResponse, MessageResponse, RecentResponse, SearchResponse};
use crate::store::StoredSearch;

/// Veriqo API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Veriqo API",
        version = "0.1.0",
        description = r#"
## Reverse image search

Upload an image with `POST /api/search/upload` to find where it appears on
social platforms. Each search is recorded on a best-effort basis and can be
listed with `GET /api/search/recent`.

Storage failures never fail a search: the response carries `id = "-1"` and an
`error` string instead.
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    tags(
        (name = "Search", description = "Reverse image search and search history"),
        (name = "Health", description = "Liveness and store diagnostics")
    ),
    paths(
        crate::handlers::health::root,
        crate::handlers::health::hello,
        crate::handlers::diagnostics::diagnostics_handler,
        crate::handlers::search::search_upload_handler,
        crate::handlers::recent::recent_searches_handler,
    ),
    components(
        schemas(
            MessageResponse,
            DiagnosticsResponse,
            SearchResponse,
            RecentResponse,
            StoredSearch,
            SearchRecord,
            Match,
            QueryType,
            SearchStatus,
        )
    )
)]
pub struct ApiDoc;
