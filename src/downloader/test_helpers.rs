//! Shared test helpers: scripted fetchers and Downloader instances backed by a temp dir.

use crate::config::Config;
use crate::downloader::Downloader;
use crate::fetcher::{FetcherCapabilities, FetcherRouter, MediaFetcher};
use crate::types::{FetchOutcome, FormatHint};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{TempDir, tempdir};

/// What a [`StubFetcher`] does for a URL
#[derive(Clone, Debug)]
pub(crate) enum Behavior {
    /// Write these relative paths (content = path) and report a single item
    Files(Vec<&'static str>),
    /// Write these relative paths and report a playlist with this title
    Playlist(&'static str, Vec<&'static str>),
    /// Report success without writing anything
    Empty,
    /// Write these files, then report failure with this message
    FailAfterWriting(&'static str, Vec<&'static str>),
    /// Report failure with this message
    Fail(&'static str),
    /// Panic inside the fetcher
    Panic,
    /// Sleep, then write one file
    Slow(Duration),
    /// Sleep; if cancelled first, write a partial file while being dropped
    WritesWhenCancelled(Duration),
}

/// Fetcher whose behavior is scripted per URL substring
///
/// Records every directory it was asked to write into, so tests can check
/// that those directories are gone afterwards.
pub(crate) struct StubFetcher {
    default: Behavior,
    routes: Vec<(&'static str, Behavior)>,
    seen_dirs: Mutex<Vec<PathBuf>>,
    late_writes: Arc<AtomicUsize>,
}

impl StubFetcher {
    pub(crate) fn new(default: Behavior) -> Self {
        Self {
            default,
            routes: Vec::new(),
            seen_dirs: Mutex::new(Vec::new()),
            late_writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Use `behavior` for URLs containing `needle`
    pub(crate) fn route(mut self, needle: &'static str, behavior: Behavior) -> Self {
        self.routes.push((needle, behavior));
        self
    }

    /// Directories passed to `fetch`, in call order
    pub(crate) fn seen_dirs(&self) -> Vec<PathBuf> {
        self.seen_dirs.lock().unwrap().clone()
    }

    /// Partial files written by cancelled fetches
    pub(crate) fn late_writes(&self) -> usize {
        self.late_writes.load(Ordering::SeqCst)
    }

    fn behavior_for(&self, url: &str) -> &Behavior {
        self.routes
            .iter()
            .find(|(needle, _)| url.contains(needle))
            .map(|(_, b)| b)
            .unwrap_or(&self.default)
    }
}

fn write_files(dir: &Path, files: &[&'static str]) {
    for rel in files {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, rel.as_bytes()).unwrap();
    }
}

/// Writes `partial.part` into `dir` when dropped, like a tool still running
/// after its caller gave up
struct LateWrite {
    dir: PathBuf,
    count: Arc<AtomicUsize>,
}

impl Drop for LateWrite {
    fn drop(&mut self) {
        std::fs::create_dir_all(&self.dir).unwrap();
        std::fs::write(self.dir.join("partial.part"), b"partial").unwrap();
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

fn success(title: &str) -> FetchOutcome {
    FetchOutcome::Success {
        title: title.to_string(),
        uploader: Some("tester".to_string()),
        content_type: "video".to_string(),
        extra: BTreeMap::new(),
    }
}

#[async_trait]
impl MediaFetcher for StubFetcher {
    async fn fetch(&self, url: &str, dir: &Path, _format: FormatHint) -> FetchOutcome {
        self.seen_dirs.lock().unwrap().push(dir.to_path_buf());

        match self.behavior_for(url).clone() {
            Behavior::Files(files) => {
                write_files(dir, &files);
                success(url)
            }
            Behavior::Playlist(title, files) => {
                write_files(dir, &files);
                FetchOutcome::PlaylistSuccess {
                    titles: files.iter().map(|f| f.to_string()).collect(),
                    playlist_title: title.to_string(),
                }
            }
            Behavior::Empty => success(url),
            Behavior::FailAfterWriting(message, files) => {
                write_files(dir, &files);
                FetchOutcome::failure(message)
            }
            Behavior::Fail(message) => FetchOutcome::failure(message),
            Behavior::Panic => panic!("stub fetcher exploded"),
            Behavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                write_files(dir, &["slow.mp4"]);
                success(url)
            }
            Behavior::WritesWhenCancelled(delay) => {
                let late = LateWrite {
                    dir: dir.to_path_buf(),
                    count: self.late_writes.clone(),
                };
                tokio::time::sleep(delay).await;
                std::mem::forget(late);
                write_files(dir, &["slow.mp4"]);
                success(url)
            }
        }
    }

    fn capabilities(&self) -> FetcherCapabilities {
        FetcherCapabilities {
            available: true,
            can_transcode: true,
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Config whose workspaces live under `temp`
pub(crate) fn test_config(temp: &TempDir) -> Config {
    let mut config = Config::default();
    config.workspace.temp_root = Some(temp.path().join("workspaces"));
    config
}

/// Downloader that sends every platform to `stub`
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) fn create_test_downloader(stub: Arc<StubFetcher>) -> (Downloader, TempDir) {
    let temp = tempdir().unwrap();
    let config = test_config(&temp);
    let downloader = Downloader::new(config, FetcherRouter::new(stub)).unwrap();
    (downloader, temp)
}

/// Like [`create_test_downloader`] with a customised configuration
pub(crate) fn create_test_downloader_with(
    stub: Arc<StubFetcher>,
    configure: impl FnOnce(&mut Config),
) -> (Downloader, TempDir) {
    let temp = tempdir().unwrap();
    let mut config = test_config(&temp);
    configure(&mut config);
    let downloader = Downloader::new(config, FetcherRouter::new(stub)).unwrap();
    (downloader, temp)
}

/// Number of entries left under the workspace root
pub(crate) fn leftover_workspaces(temp: &TempDir) -> usize {
    match std::fs::read_dir(temp.path().join("workspaces")) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}
