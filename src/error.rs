//! Error types for bakraload
//!
//! This module provides the error taxonomy shared by the download pipeline and
//! the HTTP layer:
//! - Client-facing kinds (invalid input, fetch failure, no content) that carry
//!   a message safe to show to the caller
//! - Server-side kinds (packaging, internal, I/O) whose details are logged but
//!   never returned over HTTP
//! - HTTP status code mapping and the JSON error body

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for bakraload operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message returned to callers for any server-side fault.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while processing your request.";

/// Main error type for bakraload
///
/// Every orchestration method converts lower-level faults into one of these
/// variants at its boundary, so nothing reaches the HTTP layer unconverted.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or unsupported URL, empty URL list, unknown format
    #[error("{0}")]
    InvalidInput(String),

    /// The media fetcher reported a failure (extraction error, missing tool, timeout)
    #[error("{0}")]
    FetchFailure(String),

    /// The fetch succeeded but produced no files
    #[error("No downloadable content found.")]
    NoContent,

    /// Every URL of a bulk request failed
    #[error("No downloadable content found.\n{}", errors.join("\n"))]
    BulkFailed {
        /// One `URL {i}: {message}` line per failed URL, in input order
        errors: Vec<String>,
    },

    /// Writing the zip archive failed (disk full, permission, ...)
    #[error("packaging error: {0}")]
    Packaging(String),

    /// Unanticipated fault (panicked task, broken invariant)
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "PORT")
        key: Option<String>,
    },

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

impl Error {
    /// Whether this error was caused by the caller's input or the third-party
    /// platform rather than by this server.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Message that may be shown to the caller.
    ///
    /// Server-side errors collapse to [`GENERIC_ERROR_MESSAGE`].
    pub fn public_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            GENERIC_ERROR_MESSAGE.to_string()
        }
    }
}

/// Standardized JSON error body returned by the API
///
/// # Example JSON Response
///
/// ```json
/// {
///   "status": "error",
///   "code": "invalid_input",
///   "message": "Invalid or unsupported URL."
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Always `"error"`
    pub status: String,

    /// Machine-readable error code (e.g., "invalid_input", "fetch_failed")
    pub code: String,

    /// Human-readable error message, safe to display to end users
    pub message: String,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an "invalid input" error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new("invalid_input", message)
    }

    /// Create an "internal server error" with a caller-safe message
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    /// Create a "rate limited" error
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new("rate_limited", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - caller input or third-party content
            Error::InvalidInput(_) => 400,
            Error::FetchFailure(_) => 400,
            Error::NoContent => 400,
            Error::BulkFailed { .. } => 400,

            // 500 Internal Server Error - server-side issues
            Error::Packaging(_) => 500,
            Error::Internal(_) => 500,
            Error::Io(_) => 500,
            Error::Config { .. } => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::FetchFailure(_) => "fetch_failed",
            Error::NoContent => "no_content",
            Error::BulkFailed { .. } => "bulk_failed",
            Error::Packaging(_) => "packaging_error",
            Error::Internal(_) => "internal_error",
            Error::Io(_) => "io_error",
            Error::Config { .. } => "config_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError::new(error.error_code(), error.public_message())
    }
}
