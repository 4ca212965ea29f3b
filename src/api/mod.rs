//! REST API server module
//!
//! Exposes the download pipeline over HTTP and documents it with OpenAPI.

use crate::{Config, Downloader, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod headers;
pub mod openapi;
pub mod rate_limit;
pub mod response;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Downloads
/// - `POST /download` - Download one URL, stream back the file or a zip
/// - `POST /bulk-download` - Download many URLs into one zip
///
/// ## System
/// - `GET /supported-platforms` - Static platform listing
/// - `GET /capabilities` - Fetcher and transcoder availability
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(downloader: Arc<Downloader>, config: Arc<Config>) -> Router {
    let state = AppState::new(downloader, config.clone());
    let api = &config.api;

    let router = Router::new()
        // Downloads
        .route("/download", post(routes::download))
        .route("/bulk-download", post(routes::bulk_download))
        // System
        .route("/supported-platforms", get(routes::supported_platforms))
        .route("/capabilities", get(routes::get_capabilities))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // Swagger UI carries its own copy of the document so it does not clash
    // with the /openapi.json route above
    let router = if api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router
        .with_state(state)
        .layer(DefaultBodyLimit::max(api.max_body_bytes));

    // Layer order: the LAST layer applied is the OUTERMOST. Requests pass
    // Trace → CORS → security headers → rate limit → handler, so 429
    // responses still carry CORS and security headers.
    let router = if api.rate_limit.enabled {
        let limiter = Arc::new(rate_limit::RateLimiter::new(api.rate_limit.clone()));
        router.layer(middleware::from_fn_with_state(
            limiter,
            rate_limit::rate_limit_middleware,
        ))
    } else {
        router
    };

    let security = Arc::new(headers::SecurityHeadersConfig::from_api_config(api));
    let router = router.layer(middleware::from_fn_with_state(
        security,
        headers::security_headers_middleware,
    ));

    let router = if api.cors_enabled {
        router.layer(build_cors_layer(&api.cors_origins))
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| o.trim().parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any)
    }
}

/// Start the API server on the configured bind address
///
/// Runs until SIGINT or SIGTERM is received, then stops accepting
/// connections and lets in-flight responses finish.
///
/// # Example
///
/// ```no_run
/// use bakraload::{Config, Downloader};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let downloader = Arc::new(Downloader::from_config(config.clone())?);
///
/// bakraload::api::start_api_server(downloader, Arc::new(config)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(downloader: Arc<Downloader>, config: Arc<Config>) -> Result<()> {
    start_api_server_with_shutdown(downloader, config, crate::shutdown_signal()).await
}

/// [`start_api_server`] with a caller-supplied shutdown future
pub async fn start_api_server_with_shutdown<F>(
    downloader: Arc<Downloader>,
    config: Arc<Config>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = config.api.bind_address;
    tracing::info!(address = %bind_address, "Starting API server");

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    serve(listener, downloader, config, shutdown).await
}

/// Serve the API on an already bound listener until `shutdown` completes
pub async fn serve<F>(
    listener: TcpListener,
    downloader: Arc<Downloader>,
    config: Arc<Config>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(address) = listener.local_addr() {
        tracing::info!(address = %address, "API server listening");
    }

    let app = create_router(downloader, config);

    // ConnectInfo<SocketAddr> feeds the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
