//! Single URL download handler

use super::{DownloadBody, parse_format, reject_body};
use crate::api::AppState;
use crate::api::response::file_response;
use crate::error::{Error, Result};
use crate::types::DownloadRequest;
use axum::{Json, extract::State, extract::rejection::JsonRejection, response::Response};

/// POST /download - Download one URL and stream back a file or zip
#[utoipa::path(
    post,
    path = "/download",
    tag = "downloads",
    request_body = DownloadBody,
    responses(
        (status = 200, description = "The downloaded file, or a zip when several files were produced", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid URL, unsupported format, fetch failure or no content", body = crate::error::ApiError),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn download(
    State(state): State<AppState>,
    body: std::result::Result<Json<DownloadBody>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = body.map_err(reject_body)?;

    let url = body.url.as_deref().map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return Err(Error::InvalidInput("No URL provided.".to_string()));
    }
    let format = parse_format(body.format.as_deref())?;

    let packaged = state
        .downloader
        .execute_packaged(&DownloadRequest::new(url, format))
        .await?;

    file_response(packaged.workspace, &packaged.result).await
}
