//! Common test utilities for bakraload integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bakraload::fetcher::{FetcherCapabilities, FetcherRouter, MediaFetcher};
use bakraload::{Config, Downloader, FetchOutcome, FormatHint};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Fetcher that decides what to do from the URL path
///
/// - `/files/N` writes N files named `file_{i}.mp4`
/// - `/fail` reports a failure
/// - `/empty` reports success without writing anything
/// - `/big` writes one 4 MiB file
/// - `/slow` sleeps five seconds, then writes `video.mp4`
/// - anything else writes `video.mp4`
///
/// `.mp3` replaces `.mp4` when the mp3 format is requested.
#[derive(Default)]
pub struct ScriptedFetcher {
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn success(title: &str) -> FetchOutcome {
    FetchOutcome::Success {
        title: title.to_string(),
        uploader: None,
        content_type: "video".to_string(),
        extra: BTreeMap::new(),
    }
}

#[async_trait]
impl MediaFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, dir: &Path, format: FormatHint) -> FetchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ext = if format == FormatHint::Mp3 { "mp3" } else { "mp4" };

        if url.contains("/fail") {
            return FetchOutcome::failure("Download error: This video is unavailable");
        }
        if url.contains("/empty") {
            return success(url);
        }
        if url.contains("/big") {
            std::fs::write(dir.join(format!("big.{ext}")), vec![7u8; 4 * 1024 * 1024]).unwrap();
            return success(url);
        }
        if url.contains("/slow") {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        if let Some(count) = url
            .split("/files/")
            .nth(1)
            .and_then(|n| n.parse::<usize>().ok())
        {
            for i in 1..=count {
                std::fs::write(dir.join(format!("file_{i}.{ext}")), format!("file {i}")).unwrap();
            }
            return success(url);
        }

        std::fs::write(dir.join(format!("video.{ext}")), b"video bytes").unwrap();
        success(url)
    }

    fn capabilities(&self) -> FetcherCapabilities {
        FetcherCapabilities {
            available: true,
            can_transcode: true,
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Downloader whose workspaces live in a fresh temp dir
///
/// Returns the tempdir too, which must be kept alive.
pub fn test_downloader(
    fetcher: Arc<ScriptedFetcher>,
    configure: impl FnOnce(&mut Config),
) -> (Arc<Downloader>, TempDir) {
    let temp = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.workspace.temp_root = Some(temp.path().join("ws"));
    configure(&mut config);
    let downloader = Downloader::new(config, FetcherRouter::new(fetcher)).unwrap();
    (Arc::new(downloader), temp)
}

/// Entries left under the workspace root
pub fn workspace_count(temp: &TempDir) -> usize {
    std::fs::read_dir(temp.path().join("ws"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

/// Poll until every workspace is gone (removal after streaming is asynchronous)
pub async fn wait_for_cleanup(temp: &TempDir) -> bool {
    for _ in 0..150 {
        if workspace_count(temp) == 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

/// Entry names of an in-memory zip archive
pub fn zip_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}
