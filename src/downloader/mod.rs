//! Download orchestration split into focused submodules.
//!
//! The `Downloader` struct and its methods are organized by request kind:
//! - [`single`] - One URL: validate, allocate a workspace, fetch, discover files
//! - [`bulk`] - Many URLs: fan out into per-item subdirectories, aggregate
//!   failures, merge successes into one archive
//!
//! Every method that allocates a [`Workspace`](crate::workspace::Workspace)
//! either hands it back to the caller inside its result or destroys it
//! before returning an error.

mod bulk;
mod single;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use bulk::{BULK_ARCHIVE_PREFIX, BulkDownload, MANIFEST_FILE_NAME};
pub use single::{Download, INVALID_URL_MESSAGE, PackagedDownload};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::FetcherRouter;
use crate::types::{Capabilities, FetchOutcome, FormatHint, Platform, RequestId};
use crate::workspace::{Workspace, WorkspaceManager};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Entry point for download requests
///
/// Cheap to clone; all clones share the same configuration and fetchers.
#[derive(Clone, Debug)]
pub struct Downloader {
    pub(crate) config: Arc<Config>,
    pub(crate) workspaces: WorkspaceManager,
    pub(crate) fetchers: FetcherRouter,
}

impl Downloader {
    /// Create a downloader with explicit fetchers
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration does not validate.
    pub fn new(config: Config, fetchers: FetcherRouter) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            workspaces: WorkspaceManager::from_config(&config.workspace),
            config: Arc::new(config),
            fetchers,
        })
    }

    /// Create a downloader whose fetchers are discovered from the configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let fetchers = FetcherRouter::from_config(&config.fetcher);
        Self::new(config, fetchers)
    }

    /// Shared configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Workspace allocator
    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    /// Platform to fetcher routing
    pub fn fetchers(&self) -> &FetcherRouter {
        &self.fetchers
    }

    /// Runtime capabilities for `GET /capabilities`
    pub fn capabilities(&self) -> Capabilities {
        let caps = self.fetchers.capabilities();
        Capabilities {
            fetcher: self.fetchers.generic().name().to_string(),
            fetcher_available: caps.available,
            transcoder_available: caps.can_transcode,
            bulk_max_urls: self.config.bulk.max_urls,
            bulk_concurrency: self.config.bulk.concurrency,
        }
    }

    /// Run the platform's fetcher on its own task
    ///
    /// A panicking fetcher becomes [`Error::Internal`]. If this future is
    /// dropped (timeout, cancelled request) the fetch task is aborted, and
    /// `dir` is removed again once the aborted fetch has been torn down, so a
    /// tool that wrote into it after the workspace was released leaves nothing.
    pub(crate) async fn run_fetch(
        &self,
        platform: Platform,
        url: &str,
        dir: &Path,
        format: FormatHint,
        request_id: RequestId,
    ) -> Result<FetchOutcome> {
        let fetcher = self.fetchers.for_platform(platform);
        let name = fetcher.name();
        let url = url.to_string();
        let dir = dir.to_path_buf();

        let mut task = AbortOnDrop(tokio::spawn(async move {
            // Declared before the fetch future, so dropped after it
            let mut leftovers = RemoveUnlessFinished::new(dir.clone(), request_id);
            let outcome = fetcher.fetch(&url, &dir, format).await;
            leftovers.finished();
            outcome
        }));

        match (&mut task.0).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(request_id = %request_id, fetcher = name, error = %e, "fetcher task failed");
                Err(Error::Internal(format!("fetcher {} failed: {}", name, e)))
            }
        }
    }
}

/// Destroy `workspace` off the async threads, then return `err`
pub(crate) async fn discard<T>(workspace: Workspace, err: Error) -> Result<T> {
    workspace.destroy_async().await;
    Err(err)
}

struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Removes a fetch directory when the fetch task ends without finishing
///
/// Aborting a task only drops its future the next time the runtime polls it,
/// which can be after the owning [`Workspace`] is gone. Dropping the fetch
/// future kills the fetch process, then this guard clears whatever it
/// recreated in between.
struct RemoveUnlessFinished {
    dir: PathBuf,
    request_id: RequestId,
    finished: bool,
}

impl RemoveUnlessFinished {
    fn new(dir: PathBuf, request_id: RequestId) -> Self {
        Self {
            dir,
            request_id,
            finished: false,
        }
    }

    fn finished(&mut self) {
        self.finished = true;
    }
}

impl Drop for RemoveUnlessFinished {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                debug!(request_id = %self.request_id, path = ?self.dir, "removed directory of cancelled fetch");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(request_id = %self.request_id, path = ?self.dir, error = %e, "failed to remove directory of cancelled fetch");
            }
        }
    }
}
