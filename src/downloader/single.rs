//! Single-URL download orchestration

use super::{Downloader, discard};
use crate::error::{Error, Result};
use crate::packager;
use crate::types::{DownloadRequest, FetchOutcome, FileSet, PackagedResult, Platform, RequestId};
use crate::validation::{detect_platform, is_valid_url};
use crate::workspace::Workspace;
use tracing::{info, warn};

/// Message returned for URLs that fail validation
pub const INVALID_URL_MESSAGE: &str = "Invalid or unsupported URL.";

/// A successful fetch: the workspace and the files it now holds
///
/// Dropping this value removes the workspace.
#[derive(Debug)]
pub struct Download {
    /// Workspace holding the downloaded files
    pub workspace: Workspace,
    /// Every regular file below the workspace root, never empty
    pub files: FileSet,
    /// What the fetcher reported
    pub outcome: FetchOutcome,
    /// Platform detected from the URL
    pub platform: Platform,
}

/// A successful fetch with its response already packaged
#[derive(Debug)]
pub struct PackagedDownload {
    /// Workspace holding the files and any archive
    pub workspace: Workspace,
    /// What to stream back
    pub result: PackagedResult,
    /// What the fetcher reported
    pub outcome: FetchOutcome,
    /// Platform detected from the URL
    pub platform: Platform,
}

impl Downloader {
    /// Download one URL into a fresh workspace
    ///
    /// Returns either an error or a non-empty file set, never both. On every
    /// error the workspace (if one was allocated) has already been removed.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for a malformed URL (no workspace is created)
    /// - [`Error::FetchFailure`] with the fetcher's message
    /// - [`Error::NoContent`] when the fetch wrote no files
    /// - [`Error::Internal`] when the fetcher crashed
    pub async fn execute(&self, req: &DownloadRequest) -> Result<Download> {
        let url = req.url.trim();
        if !is_valid_url(url) {
            return Err(Error::InvalidInput(INVALID_URL_MESSAGE.to_string()));
        }

        let request_id = RequestId::random();
        let platform = detect_platform(url);
        info!(request_id = %request_id, %platform, format = %req.format, "starting download");

        let workspace = self
            .workspaces
            .create_async(platform.as_str(), request_id)
            .await?;

        let outcome = match self
            .run_fetch(platform, url, workspace.root(), req.format, request_id)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return discard(workspace, e).await,
        };

        if let FetchOutcome::Failure { message } = outcome {
            warn!(request_id = %request_id, %platform, %message, "fetch failed");
            return discard(workspace, Error::FetchFailure(message)).await;
        }

        let files = match self.workspaces.discover_files_async(&workspace).await {
            Ok(files) => files,
            Err(e) => return discard(workspace, e).await,
        };
        if files.is_empty() {
            warn!(request_id = %request_id, %platform, "fetch produced no files");
            return discard(workspace, Error::NoContent).await;
        }

        info!(request_id = %request_id, %platform, files = files.len(), "download complete");
        Ok(Download {
            workspace,
            files,
            outcome,
            platform,
        })
    }

    /// [`execute`](Self::execute), then decide between single file and archive
    ///
    /// # Errors
    ///
    /// Everything [`execute`](Self::execute) returns, plus
    /// [`Error::Packaging`] when the archive cannot be written.
    pub async fn execute_packaged(&self, req: &DownloadRequest) -> Result<PackagedDownload> {
        let Download {
            workspace,
            files,
            outcome,
            platform,
        } = self.execute(req).await?;

        match packager::package_async(workspace.root(), &files, &outcome).await {
            Ok(result) => Ok(PackagedDownload {
                workspace,
                result,
                outcome,
                platform,
            }),
            Err(e) => {
                warn!(request_id = %workspace.owner(), error = %e, "packaging failed");
                discard(workspace, e).await
            }
        }
    }
}
