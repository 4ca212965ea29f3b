//! CLI-based fetcher using the external yt-dlp binary

use super::parser::parse_ytdlp_output;
use super::profile::FetchProfile;
use super::traits::{FetcherCapabilities, MediaFetcher};
use crate::config::FetcherConfig;
use crate::types::{FetchOutcome, FormatHint};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Failure reported when yt-dlp cannot be executed
pub const YT_DLP_MISSING_MESSAGE: &str = "yt-dlp is not installed or not in PATH.";

/// Failure reported when a profile needs ffmpeg and none was found
pub const FFMPEG_MISSING_MESSAGE: &str =
    "ffmpeg is not installed or not in PATH. 1080p downloads require ffmpeg.";

/// Fetcher that drives the external `yt-dlp` binary with a per-platform profile
///
/// Each fetch runs one `yt-dlp` process with `--dump-single-json
/// --no-simulate`, so the files land in the workspace and the metadata arrives
/// on stdout in one pass. The process is killed when the configured timeout
/// elapses.
///
/// # Examples
///
/// ```no_run
/// use bakraload::config::FetcherConfig;
/// use bakraload::fetcher::{FetchProfile, YtDlpFetcher};
/// use std::path::PathBuf;
///
/// let config = FetcherConfig::default();
///
/// // Explicit binary
/// let fetcher = YtDlpFetcher::new(PathBuf::from("/usr/bin/yt-dlp"), FetchProfile::youtube(), &config);
///
/// // Or auto-discover from PATH
/// let fetcher = YtDlpFetcher::discover(FetchProfile::tiktok(), &config)
///     .expect("yt-dlp not found in PATH");
/// ```
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    binary_path: PathBuf,
    ffmpeg_path: Option<PathBuf>,
    profile: FetchProfile,
    user_agent: String,
    timeout: Duration,
    audio_quality: String,
}

impl YtDlpFetcher {
    /// Create a fetcher with an explicit yt-dlp path
    ///
    /// ffmpeg is located from `config` (explicit path, then PATH).
    pub fn new(binary_path: PathBuf, profile: FetchProfile, config: &FetcherConfig) -> Self {
        Self {
            binary_path,
            ffmpeg_path: locate_ffmpeg(config),
            profile,
            user_agent: config.user_agent.clone(),
            timeout: config.timeout,
            audio_quality: config.audio_quality.clone(),
        }
    }

    /// Locate yt-dlp from `config` and create a fetcher, or `None` if not found
    pub fn discover(profile: FetchProfile, config: &FetcherConfig) -> Option<Self> {
        locate_yt_dlp(config).map(|path| Self::new(path, profile, config))
    }

    /// Override the ffmpeg location (`None` = no transcoder)
    pub fn with_ffmpeg(mut self, ffmpeg_path: Option<PathBuf>) -> Self {
        self.ffmpeg_path = ffmpeg_path;
        self
    }

    /// Override the per-fetch timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Profile this fetcher runs with
    pub fn profile(&self) -> &FetchProfile {
        &self.profile
    }

    /// Path of the yt-dlp binary
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Command-line arguments for one fetch
    pub fn build_args(&self, url: &str, workspace_dir: &Path, format: FormatHint) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--no-simulate".into(),
            "--dump-single-json".into(),
            "--no-progress".into(),
            "--user-agent".into(),
            self.user_agent.clone().into(),
            "--paths".into(),
            workspace_dir.as_os_str().to_os_string(),
            "-o".into(),
            self.profile.output_template.into(),
        ];

        args.extend(
            self.profile
                .format_args(format, &self.audio_quality)
                .into_iter()
                .map(OsString::from),
        );

        if let Some(ffmpeg) = &self.ffmpeg_path {
            args.push("--ffmpeg-location".into());
            args.push(ffmpeg.as_os_str().to_os_string());
        }

        // Everything after "--" is a URL, never an option
        args.push("--".into());
        args.push(url.into());
        args
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, workspace_dir: &Path, format: FormatHint) -> FetchOutcome {
        if self.profile.requires_transcoder && self.ffmpeg_path.is_none() {
            return FetchOutcome::failure(FFMPEG_MISSING_MESSAGE);
        }

        let args = self.build_args(url, workspace_dir, format);
        debug!(
            platform = %self.profile.platform,
            %format,
            binary = ?self.binary_path,
            "running yt-dlp"
        );

        let mut command = Command::new(&self.binary_path);
        command
            .args(&args)
            .current_dir(workspace_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(binary = ?self.binary_path, "yt-dlp binary disappeared");
                return FetchOutcome::failure(YT_DLP_MISSING_MESSAGE);
            }
            Ok(Err(e)) => {
                warn!(binary = ?self.binary_path, error = %e, "failed to execute yt-dlp");
                return FetchOutcome::failure(format!(
                    "{}: failed to start yt-dlp",
                    self.profile.error_prefix
                ));
            }
            Err(_) => {
                warn!(
                    platform = %self.profile.platform,
                    timeout_secs = self.timeout.as_secs(),
                    "yt-dlp timed out"
                );
                return FetchOutcome::failure(format!(
                    "{}: download timed out after {} seconds",
                    self.profile.error_prefix,
                    self.timeout.as_secs()
                ));
            }
        };

        let outcome = parse_ytdlp_output(
            &self.profile,
            &output.stdout,
            &output.stderr,
            output.status.success(),
        );
        if let FetchOutcome::Failure { message } = &outcome {
            debug!(
                platform = %self.profile.platform,
                status = ?output.status.code(),
                %message,
                stderr = %String::from_utf8_lossy(&output.stderr),
                "yt-dlp reported failure"
            );
        }
        outcome
    }

    fn capabilities(&self) -> FetcherCapabilities {
        FetcherCapabilities {
            available: true,
            can_transcode: self.ffmpeg_path.is_some(),
        }
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Find yt-dlp: explicit path from config first, then PATH if allowed
pub fn locate_yt_dlp(config: &FetcherConfig) -> Option<PathBuf> {
    locate_binary(config.yt_dlp_path.as_deref(), "yt-dlp", config.search_path)
}

/// Find ffmpeg: explicit path from config first, then PATH if allowed
pub fn locate_ffmpeg(config: &FetcherConfig) -> Option<PathBuf> {
    locate_binary(config.ffmpeg_path.as_deref(), "ffmpeg", config.search_path)
}

fn locate_binary(explicit: Option<&Path>, name: &str, search_path: bool) -> Option<PathBuf> {
    if let Some(path) = explicit {
        match which::which(path) {
            Ok(found) => return Some(found),
            Err(e) => warn!(binary = name, path = ?path, error = %e, "configured binary not usable"),
        }
    }

    if search_path {
        which::which(name).ok()
    } else {
        None
    }
}
