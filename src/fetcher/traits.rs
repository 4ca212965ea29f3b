//! Traits and types for media fetching

use crate::types::{FetchOutcome, FormatHint};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Capabilities of a fetcher implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetcherCapabilities {
    /// The fetcher can download at all (its backing tool was found)
    pub available: bool,
    /// A transcoder is available for audio extraction and stream merging
    pub can_transcode: bool,
}

/// Trait for downloading media from a third-party platform
///
/// Implementations write one or more files into `workspace_dir` (recursively,
/// any layout) and describe what they fetched. They never own cleanup of the
/// directory; the caller does.
///
/// # Contract
///
/// - On [`FetchOutcome::Success`] or [`FetchOutcome::PlaylistSuccess`] at
///   least one file has been written below `workspace_dir`.
/// - Internal faults (missing binary, tool crash, timeout, parse errors) are
///   reported as [`FetchOutcome::Failure`] with a caller-safe message, never
///   as a panic.
///
/// # Examples
///
/// ```no_run
/// use bakraload::fetcher::{MediaFetcher, YtDlpFetcher, FetchProfile};
/// use bakraload::config::FetcherConfig;
/// use bakraload::types::FormatHint;
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() {
/// let fetcher = YtDlpFetcher::discover(FetchProfile::generic(), &FetcherConfig::default())
///     .expect("yt-dlp not found in PATH");
///
/// let outcome = fetcher
///     .fetch("https://vimeo.com/76979871", Path::new("/tmp/work"), FormatHint::Default)
///     .await;
/// println!("{:?}", outcome);
/// # }
/// ```
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download `url` into `workspace_dir` using the requested format
    async fn fetch(&self, url: &str, workspace_dir: &Path, format: FormatHint) -> FetchOutcome;

    /// Query capabilities of this fetcher
    fn capabilities(&self) -> FetcherCapabilities;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
