//! Bulk download orchestration
//!
//! Each URL runs through the single-URL pipeline in its own workspace; its
//! files are then moved (flattened) into `item_{i}/` of one bulk workspace,
//! which is zipped once every URL has finished.

use super::{Downloader, discard};
use crate::error::{Error, GENERIC_ERROR_MESSAGE, Result};
use crate::packager::zip_directory;
use crate::types::{BulkItemResult, DownloadRequest, FetchOutcome, FormatHint, PackagedResult, RequestId};
use crate::utils::{move_into_dir, random_hex_token};
use crate::workspace::Workspace;
use futures::stream::{self, StreamExt};
use std::path::Path;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

/// Prefix of bulk archive names; a 6-character hex token and `.zip` follow
pub const BULK_ARCHIVE_PREFIX: &str = "Bulk_vid_";

/// Name of the optional failure manifest placed in bulk archives
pub const MANIFEST_FILE_NAME: &str = "errors.txt";

/// Message recorded for a URL that exceeded the per-URL timeout
const ITEM_TIMEOUT_MESSAGE: &str = "Download timed out.";

/// Result of a bulk request with at least one successful URL
///
/// Dropping this value removes the workspace and the archive inside it.
#[derive(Debug)]
pub struct BulkDownload {
    /// Bulk workspace holding `item_{i}/` subdirectories and the archive
    pub workspace: Workspace,
    /// The archive to stream back (always [`PackagedResult::Archive`])
    pub archive: PackagedResult,
    /// One entry per input URL, in input order
    pub items: Vec<BulkItemResult>,
    /// `URL {i}: {message}` for every failed URL, in input order
    pub errors: Vec<String>,
}

/// What happened to one URL of a bulk request
struct ItemReport {
    result: BulkItemResult,
    error: Option<String>,
    files: usize,
}

impl ItemReport {
    fn failed(index: usize, message: String) -> Self {
        Self {
            error: Some(format!("URL {}: {}", index, message)),
            result: BulkItemResult {
                index,
                outcome: FetchOutcome::failure(message),
            },
            files: 0,
        }
    }
}

impl Downloader {
    /// Download every URL and merge the successes into one archive
    ///
    /// URLs are processed with at most `bulk.concurrency` in flight; results
    /// and error lines always follow input order. One URL failing does not
    /// affect the others.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for an empty list or more than `bulk.max_urls` URLs
    /// - [`Error::BulkFailed`] listing every reason when no URL produced a file
    /// - [`Error::Packaging`] when the archive cannot be written
    pub async fn execute_bulk(&self, urls: &[String], format: FormatHint) -> Result<BulkDownload> {
        if urls.is_empty() {
            return Err(Error::InvalidInput("No URLs provided.".to_string()));
        }
        let max_urls = self.config.bulk.max_urls;
        if urls.len() > max_urls {
            return Err(Error::InvalidInput(format!(
                "Too many URLs: at most {} are allowed per request.",
                max_urls
            )));
        }

        let request_id = RequestId::random();
        let concurrency = self.config.bulk.concurrency.max(1);
        info!(request_id = %request_id, urls = urls.len(), concurrency, %format, "starting bulk download");

        let workspace = self.workspaces.create_async("bulk", request_id).await?;
        let root = workspace.root().to_path_buf();

        let item_root = &root;
        let reports: Vec<ItemReport> = stream::iter(urls.to_vec().into_iter().enumerate())
            .map(|(i, url)| async move { self.run_item(i + 1, &url, format, item_root).await })
            .buffered(concurrency)
            .collect()
            .await;

        let errors: Vec<String> = reports.iter().filter_map(|r| r.error.clone()).collect();
        let produced: usize = reports.iter().map(|r| r.files).sum();
        let items: Vec<BulkItemResult> = reports.into_iter().map(|r| r.result).collect();

        if produced == 0 {
            warn!(request_id = %request_id, failed = errors.len(), "bulk download produced nothing");
            return discard(workspace, Error::BulkFailed { errors }).await;
        }

        if self.config.bulk.write_manifest && !errors.is_empty() {
            let manifest = format!("{}\n", errors.join("\n"));
            if let Err(e) = tokio::fs::write(root.join(MANIFEST_FILE_NAME), manifest).await {
                warn!(request_id = %request_id, error = %e, "failed to write bulk manifest");
            }
        }

        let suggested_name = format!("{}{}.zip", BULK_ARCHIVE_PREFIX, random_hex_token(6));
        let path = root.join(&suggested_name);
        let zip_root = root.clone();
        let zip_dest = path.clone();
        let zipped = spawn_blocking(move || zip_directory(&zip_root, &zip_dest))
            .await
            .map_err(|e| Error::Internal(format!("bulk packaging task failed: {}", e)))
            .and_then(|r| r);

        match zipped {
            Ok(entries) => {
                info!(
                    request_id = %request_id,
                    entries,
                    failed = errors.len(),
                    archive = %suggested_name,
                    "bulk download complete"
                );
                Ok(BulkDownload {
                    workspace,
                    archive: PackagedResult::Archive {
                        path,
                        suggested_name,
                    },
                    items,
                    errors,
                })
            }
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "bulk packaging failed");
                discard(workspace, e).await
            }
        }
    }

    /// Fetch one bulk URL and move its files into `item_{index}/`
    async fn run_item(&self, index: usize, url: &str, format: FormatHint, root: &Path) -> ItemReport {
        let item_dir = root.join(format!("item_{}", index));
        if let Err(e) = tokio::fs::create_dir_all(&item_dir).await {
            warn!(index, error = %e, "failed to create bulk item directory");
            return ItemReport::failed(index, GENERIC_ERROR_MESSAGE.to_string());
        }

        let request = DownloadRequest::new(url, format);
        let timeout = self.config.bulk.per_url_timeout;
        let download = match tokio::time::timeout(timeout, self.execute(&request)).await {
            Ok(Ok(download)) => download,
            Ok(Err(e)) => {
                debug!(index, error = %e, "bulk item failed");
                return ItemReport::failed(index, e.public_message());
            }
            Err(_) => {
                warn!(index, timeout_secs = timeout.as_secs(), "bulk item timed out");
                return ItemReport::failed(index, ITEM_TIMEOUT_MESSAGE.to_string());
            }
        };

        let sources = download.files.into_inner();
        let dest = item_dir.clone();
        let moved = spawn_blocking(move || -> Result<usize> {
            sources.iter().try_for_each(|src| move_into_dir(src, &dest).map(|_| ()))?;
            Ok(sources.len())
        })
        .await;
        download.workspace.destroy_async().await;

        match moved {
            Ok(Ok(files)) => ItemReport {
                result: BulkItemResult {
                    index,
                    outcome: download.outcome,
                },
                error: None,
                files,
            },
            Ok(Err(e)) => {
                warn!(index, error = %e, "failed to collect bulk item files");
                discard_item(&item_dir).await;
                ItemReport::failed(index, e.public_message())
            }
            Err(e) => {
                warn!(index, error = %e, "bulk item move task failed");
                discard_item(&item_dir).await;
                ItemReport::failed(index, GENERIC_ERROR_MESSAGE.to_string())
            }
        }
    }
}

/// Empty a failed item's directory so partial files stay out of the archive
async fn discard_item(item_dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(item_dir).await {
        debug!(path = ?item_dir, error = %e, "failed to remove bulk item directory");
    }
}
