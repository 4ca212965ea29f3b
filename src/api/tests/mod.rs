use super::*;
use crate::downloader::test_helpers::{
    Behavior, StubFetcher, create_test_downloader_with, leftover_workspaces,
};
use crate::error::ApiError;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use std::io::Read;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;


/// Router over a stub fetcher, with the config adjusted by `configure`
fn create_test_router(
    stub: Arc<StubFetcher>,
    configure: impl FnOnce(&mut Config),
) -> (Router, TempDir) {
    let (downloader, temp) = create_test_downloader_with(stub, configure);
    let config = downloader.config().clone();
    (create_router(Arc::new(downloader), config), temp)
}

fn default_router(stub: Arc<StubFetcher>) -> (Router, TempDir) {
    create_test_router(stub, |_| {})
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn api_error(response: Response) -> ApiError {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Workspace removal after a streamed body runs on the blocking pool
async fn wait_for_no_workspaces(temp: &TempDir) -> bool {
    for _ in 0..100 {
        if leftover_workspaces(temp) == 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

fn zip_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

fn zip_text(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

#[tokio::test]
async fn test_api_server_shuts_down_gracefully() {
    let stub = Arc::new(StubFetcher::new(Behavior::Empty));
    let (downloader, _temp) = create_test_downloader_with(stub, |_| {});
    let config = downloader.config().clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(serve(listener, Arc::new(downloader), config, async move {
        rx.await.ok();
    }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let stub = Arc::new(StubFetcher::new(Behavior::Empty));
    let (app, _temp) = default_router(stub);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_cors_restricted_to_configured_origins() {
    let stub = Arc::new(StubFetcher::new(Behavior::Empty));
    let (app, _temp) = create_test_router(stub, |config| {
        config.api.cors_origins = vec!["https://app.example.com".to_string()];
    });

    let allowed = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "https://app.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()["access-control-allow-origin"],
        "https://app.example.com"
    );

    let other = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "https://evil.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(!other.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_cors_disabled() {
    let stub = Arc::new(StubFetcher::new(Behavior::Empty));
    let (app, _temp) = create_test_router(stub, |config| config.api.cors_enabled = false);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let stub = Arc::new(StubFetcher::new(Behavior::Empty));
    let (app, _temp) = default_router(stub);

    for request in [get("/health"), post_json("/download", serde_json::json!({}))] {
        let response = app.clone().oneshot(request).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert!(!headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    }
}

#[tokio::test]
async fn test_force_https_sends_hsts() {
    let stub = Arc::new(StubFetcher::new(Behavior::Empty));
    let (app, _temp) = create_test_router(stub, |config| config.api.force_https = true);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key(header::STRICT_TRANSPORT_SECURITY));
    assert!(response.headers().contains_key(header::CONTENT_SECURITY_POLICY));
}

#[tokio::test]
async fn test_rate_limit_returns_429_json() {
    let stub = Arc::new(StubFetcher::new(Behavior::Fail("Download error: nope")));
    let (app, _temp) = create_test_router(stub, |config| {
        config.api.rate_limit.route_limits[0].per_minute = 1;
    });
    let body = serde_json::json!({"url": "https://example.com/video"});

    let first = app.clone().oneshot(post_json("/download", body.clone())).await.unwrap();
    assert_eq!(first.status(), StatusCode::BAD_REQUEST);

    let second = app.clone().oneshot(post_json("/download", body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(second.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    let error = api_error(second).await;
    assert_eq!(error.status, "error");
    assert_eq!(error.code, "rate_limited");

    // Other routes keep their own budget
    let listing = app.oneshot(get("/supported-platforms")).await.unwrap();
    assert_eq!(listing.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_disabled() {
    let stub = Arc::new(StubFetcher::new(Behavior::Fail("Download error: nope")));
    let (app, _temp) = create_test_router(stub, |config| {
        config.api.rate_limit.enabled = false;
        config.api.rate_limit.route_limits[0].per_minute = 1;
    });

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/download",
                serde_json::json!({"url": "https://example.com/video"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let stub = Arc::new(StubFetcher::new(Behavior::Empty));
    let (app, _temp) = create_test_router(stub, |config| config.api.max_body_bytes = 64);

    let long_url = format!("https://example.com/{}", "a".repeat(200));
    let response = app
        .oneshot(post_json("/download", serde_json::json!({"url": long_url})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
