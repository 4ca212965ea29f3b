//! Fetcher used when no download tool is installed

use super::traits::{FetcherCapabilities, MediaFetcher};
use super::ytdlp::YT_DLP_MISSING_MESSAGE;
use crate::types::{FetchOutcome, FormatHint};
use async_trait::async_trait;
use std::path::Path;

/// Fetcher that fails every request with an installation hint
///
/// Lets the service start and answer `/health` and `/capabilities` even
/// when yt-dlp is missing; download requests fail with a caller-facing
/// message instead of a server error.
///
/// # Examples
///
/// ```
/// use bakraload::fetcher::{MediaFetcher, UnavailableFetcher};
/// use bakraload::types::{FetchOutcome, FormatHint};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() {
/// let outcome = UnavailableFetcher
///     .fetch("https://youtu.be/abc", Path::new("/tmp"), FormatHint::Default)
///     .await;
/// assert!(outcome.is_failure());
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableFetcher;

#[async_trait]
impl MediaFetcher for UnavailableFetcher {
    async fn fetch(&self, _url: &str, _workspace_dir: &Path, _format: FormatHint) -> FetchOutcome {
        FetchOutcome::failure(YT_DLP_MISSING_MESSAGE)
    }

    fn capabilities(&self) -> FetcherCapabilities {
        FetcherCapabilities {
            available: false,
            can_transcode: false,
        }
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
