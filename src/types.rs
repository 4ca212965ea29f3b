//! Core types for bakraload

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use utoipa::ToSchema;

/// Unique identifier for one orchestration call
///
/// Used to tag workspaces and log lines; carries no ordering meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Generate a fresh random request id
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Output format requested by the caller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FormatHint {
    /// Platform default (video with audio, best quality within limits)
    #[default]
    Default,
    /// Audio only, transcoded to MP3
    Mp3,
    /// Video merged into an MP4 container
    Mp4,
}

impl FormatHint {
    /// Wire name of the format
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatHint::Default => "default",
            FormatHint::Mp3 => "mp3",
            FormatHint::Mp4 => "mp4",
        }
    }
}

impl std::fmt::Display for FormatHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FormatHint {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Ok(FormatHint::Default),
            "mp3" => Ok(FormatHint::Mp3),
            "mp4" => Ok(FormatHint::Mp4),
            _ => Err(crate::Error::InvalidInput("Unsupported format.".to_string())),
        }
    }
}

/// Platform a URL belongs to, derived purely from the URL text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// youtube.com, youtu.be
    YouTube,
    /// instagram.com
    Instagram,
    /// tiktok.com
    TikTok,
    /// twitter.com, x.com
    Twitter,
    /// facebook.com, fb.watch
    Facebook,
    /// reddit.com
    Reddit,
    /// twitch.tv
    Twitch,
    /// pinterest.com
    Pinterest,
    /// linkedin.com
    LinkedIn,
    /// snapchat.com
    Snapchat,
    /// Anything else; routed to the generic fetcher
    Unknown,
}

impl Platform {
    /// Every platform, in declaration order
    pub const ALL: [Platform; 11] = [
        Platform::YouTube,
        Platform::Instagram,
        Platform::TikTok,
        Platform::Twitter,
        Platform::Facebook,
        Platform::Reddit,
        Platform::Twitch,
        Platform::Pinterest,
        Platform::LinkedIn,
        Platform::Snapchat,
        Platform::Unknown,
    ];

    /// Lower-case tag used in workspace prefixes, logs and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::Twitter => "twitter",
            Platform::Facebook => "facebook",
            Platform::Reddit => "reddit",
            Platform::Twitch => "twitch",
            Platform::Pinterest => "pinterest",
            Platform::LinkedIn => "linkedin",
            Platform::Snapchat => "snapchat",
            Platform::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single download request as received from the caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DownloadRequest {
    /// URL of the post, video or playlist
    pub url: String,
    /// Requested output format
    #[serde(default)]
    pub format: FormatHint,
}

impl DownloadRequest {
    /// Create a new request; surrounding whitespace is stripped from the URL
    pub fn new(url: impl AsRef<str>, format: FormatHint) -> Self {
        Self {
            url: url.as_ref().trim().to_string(),
            format,
        }
    }
}

/// Result of invoking a media fetcher
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// A single item (video, post, reel, ...) was downloaded
    Success {
        /// Title reported by the platform
        title: String,
        /// Uploader or account name, when known
        uploader: Option<String>,
        /// Kind of content ("video", "reel", "tweet", "media", ...)
        content_type: String,
        /// Additional metadata (extractor name, id, ...)
        #[serde(default)]
        extra: BTreeMap<String, String>,
    },
    /// A playlist was downloaded
    PlaylistSuccess {
        /// Entry titles in playlist order
        titles: Vec<String>,
        /// Title of the playlist itself
        playlist_title: String,
    },
    /// The fetch failed; `message` is safe to show to the caller
    Failure {
        /// Failure reason
        message: String,
    },
}

impl FetchOutcome {
    /// Shorthand for a failure outcome
    pub fn failure(message: impl Into<String>) -> Self {
        FetchOutcome::Failure {
            message: message.into(),
        }
    }

    /// Whether this outcome is a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::Failure { .. })
    }
}

/// Files discovered under a workspace after a fetch, in walk order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileSet(Vec<PathBuf>);

impl FileSet {
    /// Wrap an ordered list of absolute paths
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self(paths)
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no files were discovered
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the paths in walk order
    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.0.iter()
    }

    /// The paths as a slice
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.0
    }

    /// Consume into the underlying vector
    pub fn into_inner(self) -> Vec<PathBuf> {
        self.0
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// What the HTTP layer should send back
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackagedResult {
    /// Exactly one file was produced; send it as is
    SingleFile {
        /// Absolute path inside the owning workspace
        path: PathBuf,
        /// Attachment filename
        suggested_name: String,
    },
    /// Several files were zipped together
    Archive {
        /// Absolute path of the zip inside the owning workspace
        path: PathBuf,
        /// Attachment filename, always ending in `.zip`
        suggested_name: String,
    },
}

impl PackagedResult {
    /// Path of the file to stream
    pub fn path(&self) -> &Path {
        match self {
            PackagedResult::SingleFile { path, .. } | PackagedResult::Archive { path, .. } => path,
        }
    }

    /// Filename for the Content-Disposition header
    pub fn suggested_name(&self) -> &str {
        match self {
            PackagedResult::SingleFile { suggested_name, .. }
            | PackagedResult::Archive { suggested_name, .. } => suggested_name,
        }
    }

    /// MIME type for the response body
    pub fn content_type(&self) -> &'static str {
        match self {
            PackagedResult::Archive { .. } => "application/zip",
            PackagedResult::SingleFile { path, .. } => {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_ascii_lowercase();
                match ext.as_str() {
                    "mp3" => "audio/mpeg",
                    "m4a" => "audio/mp4",
                    "mp4" => "video/mp4",
                    "webm" => "video/webm",
                    "jpg" | "jpeg" => "image/jpeg",
                    "png" => "image/png",
                    _ => "application/octet-stream",
                }
            }
        }
    }
}

/// Per-URL result of a bulk request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BulkItemResult {
    /// 1-based position of the URL in the request
    pub index: usize,
    /// What happened for this URL
    pub outcome: FetchOutcome,
}

/// Static capability listing served by `GET /supported-platforms`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SupportedPlatforms {
    /// Platforms with video download support
    pub video_platforms: Vec<String>,
    /// Platforms with post/story support
    pub social_platforms: Vec<String>,
    /// Feature list
    pub features: Vec<String>,
}

impl SupportedPlatforms {
    /// The listing advertised by this service
    pub fn listing() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            video_platforms: owned(&[
                "YouTube (videos, shorts, playlists)",
                "TikTok",
                "Twitter/X",
                "Facebook",
                "Instagram (Reels, IGTV)",
                "Reddit",
                "Twitch",
                "Vimeo",
                "Dailymotion",
            ]),
            social_platforms: owned(&[
                "Instagram (Posts, Stories, Reels, IGTV)",
                "Twitter/X (Tweets, Threads)",
                "Facebook (Posts, Videos)",
                "Reddit (Posts, Images, Videos)",
                "LinkedIn (Posts)",
                "Pinterest (Pins)",
            ]),
            features: owned(&[
                "Auto-platform detection",
                "Bulk downloads",
                "Stories download",
                "Playlist support",
                "High quality downloads",
                "Metadata preservation",
                "Subtitle downloads",
            ]),
        }
    }
}

/// Runtime capabilities reported by `GET /capabilities`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Capabilities {
    /// Name of the generic fetcher implementation
    pub fetcher: String,
    /// Whether the fetcher can actually download (its binary was found)
    pub fetcher_available: bool,
    /// Whether a transcoder was found (required for mp3 and merged formats)
    pub transcoder_available: bool,
    /// Maximum URLs accepted by one bulk request
    pub bulk_max_urls: usize,
    /// Number of bulk URLs fetched concurrently
    pub bulk_concurrency: usize,
}
