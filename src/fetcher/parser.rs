//! Interpretation of yt-dlp output

use super::profile::FetchProfile;
use crate::types::FetchOutcome;
use serde_json::Value;
use std::collections::BTreeMap;

/// Playlist title used when the platform reports none
pub const DEFAULT_PLAYLIST_TITLE: &str = "YouTube_Playlist";

/// Maximum number of entry titles reported for a playlist
pub const MAX_PLAYLIST_TITLES: usize = 5;

/// Maximum length of a failure message taken from yt-dlp's stderr
const MAX_ERROR_LEN: usize = 500;

/// Metadata keys copied into [`FetchOutcome::Success::extra`]
const EXTRA_KEYS: [&str; 4] = ["extractor", "id", "webpage_url", "duration"];

/// Turn one yt-dlp run into a [`FetchOutcome`]
///
/// `stdout` is expected to hold the `--dump-single-json` document. With
/// `ignore_errors` profiles a non-zero exit status still counts as success
/// when metadata was produced (some playlist entries failed).
pub fn parse_ytdlp_output(
    profile: &FetchProfile,
    stdout: &[u8],
    stderr: &[u8],
    success: bool,
) -> FetchOutcome {
    let info = parse_info_json(stdout);

    let info = match info {
        Some(info) if success || profile.ignore_errors => info,
        _ if !success => {
            return FetchOutcome::failure(format!(
                "{}: {}",
                profile.error_prefix,
                error_from_stderr(stderr)
            ));
        }
        // Exit status 0 without metadata: nothing to describe, files decide
        _ => Value::Null,
    };

    if profile.playlists && is_playlist(&info) {
        let titles: Vec<String> = info
            .get("entries")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| !e.is_null())
                    .take(MAX_PLAYLIST_TITLES)
                    .map(|e| string_field(e, "title").unwrap_or_else(|| "Unknown".to_string()))
                    .collect()
            })
            .unwrap_or_default();

        if titles.is_empty() && !success {
            return FetchOutcome::failure(format!(
                "{}: {}",
                profile.error_prefix,
                error_from_stderr(stderr)
            ));
        }

        return FetchOutcome::PlaylistSuccess {
            titles,
            playlist_title: string_field(&info, "title")
                .unwrap_or_else(|| DEFAULT_PLAYLIST_TITLE.to_string()),
        };
    }

    let uploader = if profile.reports_uploader {
        string_field(&info, "uploader").or_else(|| string_field(&info, "channel"))
    } else {
        None
    };

    let mut extra = BTreeMap::new();
    for key in EXTRA_KEYS {
        if let Some(value) = scalar_field(&info, key) {
            extra.insert(key.to_string(), value);
        }
    }

    FetchOutcome::Success {
        title: string_field(&info, "title").unwrap_or_else(|| profile.default_title.to_string()),
        uploader,
        content_type: profile.content_type.to_string(),
        extra,
    }
}

/// Best human-readable error from yt-dlp's stderr
///
/// Prefers the last `ERROR:` line; falls back to the last non-empty line.
pub fn error_from_stderr(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let message = lines
        .iter()
        .rev()
        .find_map(|l| l.strip_prefix("ERROR:"))
        .map(str::trim)
        .or_else(|| lines.last().copied())
        .unwrap_or("yt-dlp exited without output");

    truncate_chars(message, MAX_ERROR_LEN)
}

fn parse_info_json(stdout: &[u8]) -> Option<Value> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // Whole document first; otherwise the last line that parses
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
        .or_else(|| {
            text.lines()
                .rev()
                .filter_map(|l| serde_json::from_str::<Value>(l.trim()).ok())
                .find(Value::is_object)
        })
}

fn is_playlist(info: &Value) -> bool {
    info.get("_type").and_then(Value::as_str) == Some("playlist")
        || info.get("entries").is_some_and(Value::is_array)
}

fn string_field(info: &Value, key: &str) -> Option<String> {
    info.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn scalar_field(info: &Value, key: &str) -> Option<String> {
    match info.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
