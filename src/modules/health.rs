use axum::{Router, routing::get};
use serde::Serialize;
use utoipa::ToSchema;

use tapak_core::ApiResponse;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthStatus)),
    tag = "Health"
)]
pub async fn health_check() -> ApiResponse<HealthStatus> {
    ApiResponse::ok(
        "Service is healthy",
        HealthStatus {
            status: "ok".to_string(),
        },
    )
}

pub fn init_health_router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
