//! Per-platform yt-dlp option sets
//!
//! Each platform gets its own output filename template, format selectors and
//! failure prefix. Everything else about fetching is shared.

use crate::types::{FormatHint, Platform};

/// yt-dlp options for one platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchProfile {
    /// Platform this profile is tuned for (`Unknown` for the generic profile)
    pub platform: Platform,
    /// Output template, relative to the workspace directory
    pub output_template: &'static str,
    /// Format selector for [`FormatHint::Default`] (None = yt-dlp default)
    pub default_format: Option<&'static str>,
    /// Format selector for [`FormatHint::Mp4`] (None = same as default)
    pub mp4_format: Option<&'static str>,
    /// Whether [`FormatHint::Mp3`] extracts audio for this platform
    pub supports_mp3: bool,
    /// Container for merged video+audio streams
    pub merge_output_format: Option<&'static str>,
    /// Download subtitles (English, including automatic captions when `auto_subtitles`)
    pub subtitles: bool,
    /// Include automatically generated captions
    pub auto_subtitles: bool,
    /// Keep going when some playlist entries fail
    pub ignore_errors: bool,
    /// Report playlists as [`crate::types::FetchOutcome::PlaylistSuccess`]
    pub playlists: bool,
    /// Refuse to run without a transcoder
    pub requires_transcoder: bool,
    /// Prefix for failure messages ("YouTube error")
    pub error_prefix: &'static str,
    /// Title used when the platform reports none
    pub default_title: &'static str,
    /// Content type reported on success
    pub content_type: &'static str,
    /// Whether the uploader is meaningful for this platform
    pub reports_uploader: bool,
}

impl FetchProfile {
    /// Profile for a platform; platforms without a dedicated profile use [`generic`](Self::generic)
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::YouTube => Self::youtube(),
            Platform::Instagram => Self::instagram(),
            Platform::TikTok => Self::tiktok(),
            Platform::Twitter => Self::twitter(),
            Platform::Facebook => Self::facebook(),
            Platform::Reddit => Self::reddit(),
            _ => Self::generic(),
        }
    }

    /// Platforms that have a dedicated profile
    pub fn dedicated_platforms() -> [Platform; 6] {
        [
            Platform::YouTube,
            Platform::Instagram,
            Platform::TikTok,
            Platform::Twitter,
            Platform::Facebook,
            Platform::Reddit,
        ]
    }

    /// Videos, shorts and playlists, capped at 1080p by default
    pub fn youtube() -> Self {
        Self {
            platform: Platform::YouTube,
            output_template: "%(uploader)s - %(title)s.%(ext)s",
            default_format: Some("bestvideo[height<=1080]+bestaudio/best[height<=1080]"),
            mp4_format: Some("bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best"),
            supports_mp3: true,
            merge_output_format: Some("mp4"),
            subtitles: true,
            auto_subtitles: true,
            ignore_errors: true,
            playlists: true,
            requires_transcoder: true,
            error_prefix: "YouTube error",
            default_title: "Unknown",
            content_type: "video",
            reports_uploader: true,
        }
    }

    /// Posts, reels and IGTV; format hints are ignored
    pub fn instagram() -> Self {
        Self {
            platform: Platform::Instagram,
            output_template: "Instagram_%(uploader)s_%(id)s.%(ext)s",
            default_format: None,
            mp4_format: None,
            supports_mp3: false,
            merge_output_format: None,
            subtitles: false,
            auto_subtitles: false,
            ignore_errors: false,
            playlists: false,
            requires_transcoder: false,
            error_prefix: "Instagram error",
            default_title: "Instagram Post",
            content_type: "post",
            reports_uploader: true,
        }
    }

    /// TikTok videos
    pub fn tiktok() -> Self {
        Self {
            platform: Platform::TikTok,
            output_template: "TikTok_%(uploader)s_%(title)s.%(ext)s",
            default_format: Some("best"),
            mp4_format: None,
            supports_mp3: true,
            merge_output_format: None,
            subtitles: false,
            auto_subtitles: false,
            ignore_errors: false,
            playlists: false,
            requires_transcoder: false,
            error_prefix: "TikTok error",
            default_title: "TikTok Video",
            content_type: "video",
            reports_uploader: true,
        }
    }

    /// Twitter/X videos and images
    pub fn twitter() -> Self {
        Self {
            platform: Platform::Twitter,
            output_template: "Twitter_%(uploader)s_%(title)s.%(ext)s",
            default_format: None,
            mp4_format: None,
            supports_mp3: true,
            merge_output_format: None,
            subtitles: true,
            auto_subtitles: false,
            ignore_errors: false,
            playlists: false,
            requires_transcoder: false,
            error_prefix: "Twitter error",
            default_title: "Twitter Content",
            content_type: "tweet",
            reports_uploader: true,
        }
    }

    /// Facebook videos and posts
    pub fn facebook() -> Self {
        Self {
            platform: Platform::Facebook,
            output_template: "Facebook_%(title)s.%(ext)s",
            default_format: Some("best"),
            mp4_format: None,
            supports_mp3: true,
            merge_output_format: None,
            subtitles: false,
            auto_subtitles: false,
            ignore_errors: false,
            playlists: false,
            requires_transcoder: false,
            error_prefix: "Facebook error",
            default_title: "Facebook Content",
            content_type: "video",
            reports_uploader: false,
        }
    }

    /// Reddit videos, images and gifs
    pub fn reddit() -> Self {
        Self {
            platform: Platform::Reddit,
            output_template: "Reddit_%(title)s.%(ext)s",
            default_format: None,
            mp4_format: None,
            supports_mp3: true,
            merge_output_format: None,
            subtitles: false,
            auto_subtitles: false,
            ignore_errors: false,
            playlists: false,
            requires_transcoder: false,
            error_prefix: "Reddit error",
            default_title: "Reddit Post",
            content_type: "post",
            reports_uploader: false,
        }
    }

    /// Best-effort profile for any site yt-dlp understands
    pub fn generic() -> Self {
        Self {
            platform: Platform::Unknown,
            output_template: "%(extractor)s_%(title)s.%(ext)s",
            default_format: Some("best"),
            mp4_format: None,
            supports_mp3: true,
            merge_output_format: None,
            subtitles: false,
            auto_subtitles: false,
            ignore_errors: false,
            playlists: false,
            requires_transcoder: false,
            error_prefix: "Download error",
            default_title: "Unknown",
            content_type: "media",
            reports_uploader: false,
        }
    }

    /// Format/post-processing arguments for a format hint
    ///
    /// `audio_quality` is the MP3 bitrate in kbps.
    pub fn format_args(&self, format: FormatHint, audio_quality: &str) -> Vec<String> {
        let mut args = Vec::new();

        if format == FormatHint::Mp3 && self.supports_mp3 {
            args.push("-f".to_string());
            args.push("bestaudio/best".to_string());
            args.push("--extract-audio".to_string());
            args.push("--audio-format".to_string());
            args.push("mp3".to_string());
            args.push("--audio-quality".to_string());
            args.push(format!("{}K", audio_quality));
            if self.ignore_errors {
                args.push("--ignore-errors".to_string());
            }
            return args;
        }

        let selector = match format {
            FormatHint::Mp4 => self.mp4_format.or(self.default_format),
            _ => self.default_format,
        };
        if let Some(selector) = selector {
            args.push("-f".to_string());
            args.push(selector.to_string());
        }

        // Subtitles only accompany the default (full quality) download
        if format == FormatHint::Default && self.subtitles {
            args.push("--write-subs".to_string());
            if self.auto_subtitles {
                args.push("--write-auto-subs".to_string());
            }
            args.push("--sub-langs".to_string());
            args.push("en".to_string());
        }
        if self.ignore_errors {
            args.push("--ignore-errors".to_string());
        }
        if let Some(container) = self.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(container.to_string());
        }

        args
    }
}
