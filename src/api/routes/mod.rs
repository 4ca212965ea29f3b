//! Route handlers for the REST API
//!
//! Handlers are organized by request kind:
//! - [`download`] - Single URL download
//! - [`bulk`] - Bulk download into one archive
//! - [`system`] - Health, capabilities, supported platforms, OpenAPI

use crate::error::Error;
use crate::types::FormatHint;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

mod bulk;
mod download;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use bulk::*;
pub use download::*;
pub use system::*;

// ============================================================================
// Request Types (shared across handlers)
// ============================================================================

/// Body of `POST /download`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DownloadBody {
    /// URL of the video, post or playlist
    #[serde(default)]
    pub url: Option<String>,

    /// "default", "mp3" or "mp4" (default: "default")
    #[serde(default)]
    pub format: Option<String>,
}

/// Body of `POST /bulk-download`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BulkBody {
    /// URLs to download, in order
    #[serde(default)]
    pub urls: Option<Vec<String>>,

    /// Output format applied to every URL
    #[serde(default)]
    pub format: Option<String>,
}

/// Response of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: String,
    /// Crate version
    pub version: String,
}

/// Parse the optional `format` field
fn parse_format(format: Option<&str>) -> Result<FormatHint, Error> {
    format.map_or(Ok(FormatHint::Default), str::parse)
}

/// Turn a body that is not valid JSON into a client error
fn reject_body(rejection: JsonRejection) -> Error {
    tracing::debug!(error = %rejection.body_text(), "rejected request body");
    Error::InvalidInput("Request body must be a JSON object.".to_string())
}
