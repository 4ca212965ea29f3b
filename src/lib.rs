//! # bakraload
//!
//! Universal social media download proxy: give it a post, video or playlist
//! URL and it detects the platform, fetches the media into a private
//! workspace, and hands back either the single file or a zip archive.
//!
//! ## Design Philosophy
//!
//! - **One workspace per request** - every download runs in its own temporary
//!   directory, removed on every exit path (including a dropped response body)
//! - **Pluggable fetchers** - the [`MediaFetcher`](fetcher::MediaFetcher)
//!   trait hides the external tool; tests swap in scripted fetchers
//! - **Non-leaky errors** - callers see a short message, internal details go
//!   to the log
//!
//! ## Quick Start
//!
//! ```no_run
//! use bakraload::{Config, Downloader, DownloadRequest, FormatHint};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = Downloader::from_config(Config::from_env()?)?;
//!
//!     let packaged = downloader
//!         .execute_packaged(&DownloadRequest::new(
//!             "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
//!             FormatHint::Mp3,
//!         ))
//!         .await?;
//!     println!("ready: {}", packaged.result.suggested_name());
//!
//!     // Dropping `packaged` removes its workspace
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Download orchestration (single URL and bulk)
pub mod downloader;
/// Error types
pub mod error;
/// Media fetchers (yt-dlp) and platform routing
pub mod fetcher;
/// Single-file or archive packaging
pub mod packager;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;
/// URL validation, platform detection and filename sanitizing
pub mod validation;
/// Per-request temporary workspaces
pub mod workspace;

// Re-export commonly used types
pub use config::{ApiConfig, BulkConfig, Config, FetcherConfig, RateLimitConfig, WorkspaceConfig};
pub use downloader::{BulkDownload, Download, Downloader, PackagedDownload};
pub use error::{ApiError, Error, Result, ToHttpStatus};
pub use fetcher::{FetcherRouter, MediaFetcher};
pub use types::{
    BulkItemResult, Capabilities, DownloadRequest, FetchOutcome, FileSet, FormatHint,
    PackagedResult, Platform, RequestId, SupportedPlatforms,
};
pub use workspace::{Workspace, WorkspaceManager};

/// Future that completes when the process receives a termination signal
///
/// On Unix this is SIGTERM or SIGINT; elsewhere Ctrl+C. A signal whose
/// handler cannot be installed is never reported, so in the worst case the
/// future only resolves through `ctrl_c`.
///
/// Pass it to [`api::start_api_server_with_shutdown`] or use
/// [`api::start_api_server`], which waits on it already.
pub async fn shutdown_signal() {
    let signal = wait_for_signal().await;
    tracing::info!(signal, "stopping server, in-flight downloads finish first");
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{Signal, SignalKind, signal};

    async fn next(listener: Option<Signal>) {
        match listener {
            Some(mut listener) => {
                listener.recv().await;
            }
            None => std::future::pending().await,
        }
    }

    let install = |kind: SignalKind, name: &'static str| match signal(kind) {
        Ok(listener) => Some(listener),
        Err(e) => {
            tracing::warn!(signal = name, error = %e, "signal handler unavailable");
            None
        }
    };
    let sigterm = install(SignalKind::terminate(), "SIGTERM");
    let sigint = install(SignalKind::interrupt(), "SIGINT");

    if sigterm.is_none() && sigint.is_none() {
        return ctrl_c().await;
    }

    tokio::select! {
        _ = next(sigterm) => "SIGTERM",
        _ = next(sigint) => "SIGINT",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl+C, shutdown only via process kill");
        std::future::pending::<()>().await;
    }
    "Ctrl+C"
}
