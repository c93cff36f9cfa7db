//! Liveness handlers

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

/// Simple message response
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Veriqo backend running")]
    pub message: &'static str,
}

/// GET / - Liveness message
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses((status = 200, description = "Service is running", body = MessageResponse))
)]
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Veriqo backend running",
    })
}

/// GET /api/hello - Liveness message under the API prefix
#[utoipa::path(
    get,
    path = "/api/hello",
    tag = "Health",
    responses((status = 200, description = "Service is running", body = MessageResponse))
)]
pub async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello from Veriqo API",
    })
}
