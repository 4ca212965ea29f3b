//! Media fetching
//!
//! This module provides a trait-based architecture for downloading media from
//! third-party platforms into a workspace directory. The core abstraction is
//! the [`MediaFetcher`] trait. Implementations:
//!
//! - [`YtDlpFetcher`]: drives the external `yt-dlp` binary, tuned per platform
//!   by a [`FetchProfile`]
//! - [`UnavailableFetcher`]: stub used when yt-dlp is not installed
//!
//! [`FetcherRouter`] picks the implementation for a detected platform.
//!
//! ## Usage
//!
//! ```no_run
//! use bakraload::config::FetcherConfig;
//! use bakraload::fetcher::FetcherRouter;
//! use bakraload::types::{FetchOutcome, FormatHint, Platform};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = FetcherRouter::from_config(&FetcherConfig::default());
//!     let fetcher = router.for_platform(Platform::TikTok);
//!
//!     match fetcher
//!         .fetch("https://www.tiktok.com/v/123", Path::new("/tmp/ws"), FormatHint::Mp3)
//!         .await
//!     {
//!         FetchOutcome::Failure { message } => eprintln!("{message}"),
//!         outcome => println!("{outcome:?}"),
//!     }
//! }
//! ```

mod parser;
mod profile;
mod router;
mod traits;
mod unavailable;
mod ytdlp;

pub use parser::{DEFAULT_PLAYLIST_TITLE, MAX_PLAYLIST_TITLES, error_from_stderr, parse_ytdlp_output};
pub use profile::FetchProfile;
pub use router::FetcherRouter;
pub use traits::{FetcherCapabilities, MediaFetcher};
pub use unavailable::UnavailableFetcher;
pub use ytdlp::{
    FFMPEG_MISSING_MESSAGE, YT_DLP_MISSING_MESSAGE, YtDlpFetcher, locate_ffmpeg, locate_yt_dlp,
};
