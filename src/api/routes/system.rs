//! System handlers: health, capabilities, supported platforms, OpenAPI.

use super::HealthResponse;
use crate::api::AppState;
use crate::types::{Capabilities, SupportedPlatforms};
use axum::{Json, extract::State, response::IntoResponse};

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /capabilities - Fetcher and transcoder availability
#[utoipa::path(
    get,
    path = "/capabilities",
    tag = "system",
    responses(
        (status = 200, description = "Current capabilities", body = Capabilities)
    )
)]
pub async fn get_capabilities(State(state): State<AppState>) -> Json<Capabilities> {
    Json(state.downloader.capabilities())
}

/// GET /supported-platforms - Static platform listing
#[utoipa::path(
    get,
    path = "/supported-platforms",
    tag = "system",
    responses(
        (status = 200, description = "Supported platforms and features", body = SupportedPlatforms)
    )
)]
pub async fn supported_platforms() -> Json<SupportedPlatforms> {
    Json(SupportedPlatforms::listing())
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3 specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}
