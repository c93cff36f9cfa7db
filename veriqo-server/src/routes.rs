//! Router configuration module
//!
//! Configures all routes, middleware layers, and creates the application router.

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::handlers::{
    diagnostics_handler, hello, not_found, recent_searches_handler, root, search_upload_handler,
};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the application router using the configuration held in `state`
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();
    create_router_with_config(&config, state)
}

/// Create the application router with custom configuration
pub fn create_router_with_config(config: &Config, state: AppState) -> Router {
    // Configure CORS based on allowed_origins
    let cors = match &config.allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            tracing::info!("CORS: Restricting to {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        }
        _ => {
            tracing::debug!("CORS: Allowing all origins");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    // Request body limit. The multipart extractor has its own 2 MB default,
    // which is raised to the same bound.
    let body_limit_bytes = config.body_limit();
    let body_limit = RequestBodyLimitLayer::new(body_limit_bytes);

    // Request timeout
    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.timeout_secs),
    );

    Router::new()
        .route("/", get(root))
        .route("/api/hello", get(hello))
        .route("/test", get(diagnostics_handler))
        .route("/api/search/upload", post(search_upload_handler))
        .route("/api/search/recent", get(recent_searches_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(cors)
        .layer(body_limit)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
}
