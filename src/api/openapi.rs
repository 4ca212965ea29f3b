//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the bakraload REST API using utoipa
//! for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the bakraload REST API
///
/// The document can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "bakraload REST API",
        version = "0.1.0",
        description = "Download media from YouTube, TikTok, Instagram, Twitter/X, Facebook, Reddit and other platforms; single files are streamed back as is, multiple files as a zip archive",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        // Downloads
        crate::api::routes::download,
        crate::api::routes::bulk_download,

        // System
        crate::api::routes::health_check,
        crate::api::routes::get_capabilities,
        crate::api::routes::supported_platforms,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::FormatHint,
        crate::types::Platform,
        crate::types::FetchOutcome,
        crate::types::BulkItemResult,
        crate::types::SupportedPlatforms,
        crate::types::Capabilities,

        // API request/response types from routes
        crate::api::routes::DownloadBody,
        crate::api::routes::BulkBody,
        crate::api::routes::HealthResponse,

        // Error types from error.rs
        crate::error::ApiError,
    )),
    tags(
        (name = "downloads", description = "Downloads - Fetch one URL or many and receive the media"),
        (name = "system", description = "System endpoints - Health checks, capabilities, supported platforms, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
