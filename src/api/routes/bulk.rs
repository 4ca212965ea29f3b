//! Bulk download handler

use super::{BulkBody, parse_format, reject_body};
use crate::api::AppState;
use crate::api::response::file_response;
use crate::error::{Error, Result};
use axum::{Json, extract::State, extract::rejection::JsonRejection, response::Response};

/// POST /bulk-download - Download many URLs into one `Bulk_vid_{TOKEN}.zip`
///
/// Failed URLs are skipped; the request only fails when every URL failed.
#[utoipa::path(
    post,
    path = "/bulk-download",
    tag = "downloads",
    request_body = BulkBody,
    responses(
        (status = 200, description = "Zip archive with one item_{i}/ directory per successful URL", content_type = "application/zip"),
        (status = 400, description = "No URLs, too many URLs, or every URL failed (message lists each reason)", body = crate::error::ApiError),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn bulk_download(
    State(state): State<AppState>,
    body: std::result::Result<Json<BulkBody>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = body.map_err(reject_body)?;

    let urls: Vec<String> = body
        .urls
        .unwrap_or_default()
        .iter()
        .map(|u| u.trim().to_string())
        .collect();
    if urls.is_empty() {
        return Err(Error::InvalidInput("No URLs provided.".to_string()));
    }
    let format = parse_format(body.format.as_deref())?;

    let bulk = state.downloader.execute_bulk(&urls, format).await?;
    if !bulk.errors.is_empty() {
        tracing::info!(
            failed = bulk.errors.len(),
            total = urls.len(),
            "bulk download finished with failures"
        );
    }

    file_response(bulk.workspace, &bulk.archive).await
}
