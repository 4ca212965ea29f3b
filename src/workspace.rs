//! Per-request temporary workspaces
//!
//! A [`Workspace`] is a uniquely named directory owned by exactly one
//! orchestration call. It is removed when [`Workspace::destroy`] is called or
//! when the value is dropped, whichever comes first, so every exit path
//! (early return, `?`, panic unwinding, dropped response body) releases it.

use crate::config::WorkspaceConfig;
use crate::error::{Error, Result};
use crate::types::{FileSet, RequestId};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::task::spawn_blocking;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// An isolated temporary directory owned by one request
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    owner: RequestId,
    dir: Option<TempDir>,
}

impl Workspace {
    /// Root directory of the workspace
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Request that owns this workspace
    pub fn owner(&self) -> RequestId {
        self.owner
    }

    /// Whether [`destroy`](Self::destroy) has already run
    pub fn is_destroyed(&self) -> bool {
        self.dir.is_none()
    }

    /// Create (or reuse) a direct subdirectory of the workspace
    pub fn subdir(&self, name: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        std::fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Recursively list all regular files under the workspace root
    ///
    /// Entries are visited in file-name order so the result is stable for a
    /// given directory tree. Symlinks are not followed.
    pub fn discover_files(&self) -> Result<FileSet> {
        discover_files_under(&self.root)
    }

    /// Remove the directory tree
    ///
    /// Idempotent. Failures are logged and swallowed: cleanup must never mask
    /// the primary response.
    pub fn destroy(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        match dir.close() {
            Ok(()) => {
                debug!(request_id = %self.owner, path = ?self.root, "workspace removed");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(request_id = %self.owner, path = ?self.root, "workspace already gone");
            }
            Err(e) => {
                warn!(
                    request_id = %self.owner,
                    path = ?self.root,
                    error = %e,
                    "failed to remove workspace"
                );
            }
        }
    }

    /// Remove the directory tree on the blocking thread pool
    pub async fn destroy_async(mut self) {
        let owner = self.owner;
        if let Err(e) = spawn_blocking(move || self.destroy()).await {
            warn!(request_id = %owner, error = %e, "workspace cleanup task failed");
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Recursively list all regular files below `root`, in file-name order
pub fn discover_files_under(root: &Path) -> Result<FileSet> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "failed to walk workspace: {}",
                e
            )))
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(FileSet::new(files))
}

/// Allocates workspaces under a common root directory
#[derive(Clone, Debug)]
pub struct WorkspaceManager {
    root: PathBuf,
    prefix: String,
}

impl WorkspaceManager {
    /// Create a manager that allocates directories named `{prefix}_{tag}_XXXXXX` under `root`
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    /// Create a manager from configuration
    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(config.root(), config.prefix.clone())
    }

    /// Directory under which workspaces are created
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a fresh, empty, uniquely named workspace
    ///
    /// `tag` distinguishes the kind of request (platform name, "bulk").
    pub fn create(&self, tag: &str, owner: RequestId) -> Result<Workspace> {
        std::fs::create_dir_all(&self.root)?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("{}_{}_", self.prefix, tag))
            .rand_bytes(10)
            .tempdir_in(&self.root)?;
        let root = dir.path().to_path_buf();

        debug!(request_id = %owner, path = ?root, "workspace created");

        Ok(Workspace {
            root,
            owner,
            dir: Some(dir),
        })
    }

    /// [`create`](Self::create) on the blocking thread pool
    pub async fn create_async(&self, tag: &str, owner: RequestId) -> Result<Workspace> {
        let manager = self.clone();
        let tag = tag.to_string();
        spawn_blocking(move || manager.create(&tag, owner))
            .await
            .map_err(|e| Error::Internal(format!("workspace creation task failed: {}", e)))?
    }

    /// Recursively list all regular files in a workspace
    pub fn discover_files(&self, ws: &Workspace) -> Result<FileSet> {
        ws.discover_files()
    }

    /// [`discover_files`](Self::discover_files) on the blocking thread pool
    pub async fn discover_files_async(&self, ws: &Workspace) -> Result<FileSet> {
        let root = ws.root().to_path_buf();
        spawn_blocking(move || discover_files_under(&root))
            .await
            .map_err(|e| Error::Internal(format!("file discovery task failed: {}", e)))?
    }

    /// Remove a workspace; see [`Workspace::destroy`]
    pub fn destroy(&self, mut ws: Workspace) {
        ws.destroy();
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn manager(root: &Path) -> WorkspaceManager {
        WorkspaceManager::new(root, "bakraload")
    }

    #[test]
    fn create_allocates_empty_prefixed_directory() {
        let temp = tempdir().unwrap();
        let ws = manager(temp.path())
            .create("youtube", RequestId(7))
            .unwrap();

        assert!(ws.root().is_dir());
        assert!(ws.root().starts_with(temp.path()));
        let name = ws.root().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("bakraload_youtube_"), "{name}");
        assert_eq!(std::fs::read_dir(ws.root()).unwrap().count(), 0);
        assert_eq!(ws.owner(), RequestId(7));
    }

    #[test]
    fn concurrent_creations_never_collide() {
        let temp = tempdir().unwrap();
        let mgr = manager(temp.path());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let mgr = mgr.clone();
                std::thread::spawn(move || mgr.create("bulk", RequestId(i)).unwrap())
            })
            .collect();
        let workspaces: Vec<Workspace> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let mut roots: Vec<&Path> = workspaces.iter().map(|w| w.root()).collect();
        roots.sort();
        roots.dedup();
        assert_eq!(roots.len(), 16);
    }

    #[test]
    fn create_makes_missing_root() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("a").join("b");
        let ws = manager(&nested).create("tiktok", RequestId(1)).unwrap();
        assert!(ws.root().starts_with(&nested));
    }

    #[test]
    fn discover_files_walks_recursively_in_stable_order() {
        let temp = tempdir().unwrap();
        let ws = manager(temp.path()).create("reddit", RequestId(1)).unwrap();
        std::fs::write(ws.root().join("b.mp4"), b"b").unwrap();
        std::fs::create_dir_all(ws.root().join("nested/deeper")).unwrap();
        std::fs::write(ws.root().join("nested/deeper/c.jpg"), b"c").unwrap();
        std::fs::write(ws.root().join("a.mp4"), b"a").unwrap();
        std::fs::create_dir_all(ws.root().join("empty")).unwrap();

        let first = ws.discover_files().unwrap();
        let second = ws.discover_files().unwrap();
        assert_eq!(first, second);

        let relative: Vec<String> = first
            .iter()
            .map(|p| p.strip_prefix(ws.root()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(relative, vec!["a.mp4", "b.mp4", "nested/deeper/c.jpg"]);
        assert!(first.iter().all(|p| p.is_absolute() || p.starts_with(temp.path())));
    }

    #[test]
    fn discover_files_on_empty_workspace_is_empty() {
        let temp = tempdir().unwrap();
        let ws = manager(temp.path()).create("unknown", RequestId(1)).unwrap();
        assert!(ws.discover_files().unwrap().is_empty());
    }

    #[test]
    fn destroy_is_idempotent() {
        let temp = tempdir().unwrap();
        let mut ws = manager(temp.path()).create("youtube", RequestId(1)).unwrap();
        std::fs::write(ws.root().join("video.mp4"), b"data").unwrap();
        let root = ws.root().to_path_buf();

        ws.destroy();
        assert!(!root.exists());
        assert!(ws.is_destroyed());

        ws.destroy();
        assert!(!root.exists());
    }

    #[test]
    fn destroy_tolerates_externally_removed_directory() {
        let temp = tempdir().unwrap();
        let mut ws = manager(temp.path()).create("youtube", RequestId(1)).unwrap();
        std::fs::remove_dir_all(ws.root()).unwrap();
        ws.destroy();
        assert!(ws.is_destroyed());
    }

    #[test]
    fn drop_removes_directory() {
        let temp = tempdir().unwrap();
        let root = {
            let ws = manager(temp.path()).create("facebook", RequestId(1)).unwrap();
            std::fs::create_dir_all(ws.root().join("sub")).unwrap();
            std::fs::write(ws.root().join("sub/file.bin"), b"x").unwrap();
            ws.root().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn subdir_is_created_inside_root() {
        let temp = tempdir().unwrap();
        let ws = manager(temp.path()).create("bulk", RequestId(1)).unwrap();
        let item = ws.subdir("item_1").unwrap();
        assert!(item.is_dir());
        assert_eq!(item.parent().unwrap(), ws.root());
    }

    #[tokio::test]
    async fn async_variants_behave_like_blocking_ones() {
        let temp = tempdir().unwrap();
        let mgr = manager(temp.path());
        let ws = mgr.create_async("twitch", RequestId(3)).await.unwrap();
        std::fs::write(ws.root().join("clip.mp4"), b"x").unwrap();

        let files = mgr.discover_files_async(&ws).await.unwrap();
        assert_eq!(files.len(), 1);

        let root = ws.root().to_path_buf();
        ws.destroy_async().await;
        assert!(!root.exists());
    }
}
