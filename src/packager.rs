//! Single-file vs archive result packaging
//!
//! Exactly one discovered file is sent back as is. Anything more is zipped
//! into the owning workspace, with entry names relative to the workspace
//! root so per-platform subdirectories survive.

use crate::error::{Error, Result};
use crate::types::{FetchOutcome, FileSet, PackagedResult};
use crate::utils::get_unique_path;
use crate::validation::{DEFAULT_MAX_FILENAME_LEN, sanitize_filename};
use crate::workspace::discover_files_under;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::debug;
use zip::ZipWriter;
use zip::write::FileOptions;

/// Archive name used when nothing better is known
pub const DEFAULT_ARCHIVE_NAME: &str = "download.zip";

/// Decide how to send `files` back and build the archive if needed
///
/// `workspace_root` must contain every path in `files`; the archive is
/// written there too.
///
/// # Errors
///
/// - [`Error::NoContent`] when `files` is empty
/// - [`Error::Packaging`] when the archive cannot be written
pub fn package(
    workspace_root: &Path,
    files: &FileSet,
    outcome: &FetchOutcome,
) -> Result<PackagedResult> {
    match files.as_slice() {
        [] => Err(Error::NoContent),
        [single] => {
            let suggested_name = single
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| Error::Packaging(format!("file has no name: {:?}", single)))?;
            Ok(PackagedResult::SingleFile {
                path: single.clone(),
                suggested_name,
            })
        }
        many => {
            let suggested_name = archive_name(outcome);
            let path = get_unique_path(&workspace_root.join(&suggested_name))?;
            let entries = build_zip(workspace_root, many, &path)?;
            debug!(entries, archive = ?path, "packaged files into archive");
            Ok(PackagedResult::Archive {
                path,
                suggested_name,
            })
        }
    }
}

/// [`package`] on the blocking thread pool
pub async fn package_async(
    workspace_root: &Path,
    files: &FileSet,
    outcome: &FetchOutcome,
) -> Result<PackagedResult> {
    let root = workspace_root.to_path_buf();
    let files = files.clone();
    let outcome = outcome.clone();
    spawn_blocking(move || package(&root, &files, &outcome))
        .await
        .map_err(|e| Error::Internal(format!("packaging task failed: {}", e)))?
}

/// Attachment name for a multi-file result
///
/// Playlists are named after their sanitized title; everything else, and
/// any title that sanitizes to nothing, gets [`DEFAULT_ARCHIVE_NAME`].
///
/// # Examples
///
/// ```
/// use bakraload::packager::archive_name;
/// use bakraload::types::FetchOutcome;
///
/// let playlist = FetchOutcome::PlaylistSuccess {
///     titles: vec![],
///     playlist_title: "My: Cool/List".to_string(),
/// };
/// assert_eq!(archive_name(&playlist), "My_ Cool_List.zip");
/// assert_eq!(archive_name(&FetchOutcome::failure("x")), "download.zip");
/// ```
pub fn archive_name(outcome: &FetchOutcome) -> String {
    match outcome {
        FetchOutcome::PlaylistSuccess { playlist_title, .. } => {
            let stem = sanitize_filename(playlist_title, DEFAULT_MAX_FILENAME_LEN);
            if stem.is_empty() {
                DEFAULT_ARCHIVE_NAME.to_string()
            } else {
                format!("{}.zip", stem)
            }
        }
        _ => DEFAULT_ARCHIVE_NAME.to_string(),
    }
}

/// Write `files` into a new deflate archive at `dest`
///
/// Entry names are the paths relative to `root`, with `/` separators, in
/// the order given. Returns the number of entries written.
pub fn build_zip(root: &Path, files: &[PathBuf], dest: &Path) -> Result<usize> {
    let out = File::create(dest).map_err(|e| packaging_io("create archive", dest, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(out));
    let options = FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    for path in files {
        let name = entry_name(root, path)?;
        zip.start_file(name, options)
            .map_err(|e| Error::Packaging(format!("failed to add {:?}: {}", path, e)))?;

        let mut input = BufReader::new(File::open(path).map_err(|e| packaging_io("open", path, e))?);
        io::copy(&mut input, &mut zip).map_err(|e| packaging_io("compress", path, e))?;
    }

    let mut writer = zip
        .finish()
        .map_err(|e| Error::Packaging(format!("failed to finish archive {:?}: {}", dest, e)))?;
    writer
        .flush()
        .map_err(|e| packaging_io("flush archive", dest, e))?;

    Ok(files.len())
}

/// Zip every regular file under `root` into `dest`, skipping existing `.zip` files
///
/// Any file whose name ends in `.zip` is left out, including media a fetcher
/// happened to deliver in that format. Returns the number of entries.
pub fn zip_directory(root: &Path, dest: &Path) -> Result<usize> {
    let files: Vec<PathBuf> = discover_files_under(root)?
        .into_inner()
        .into_iter()
        .filter(|p| !p.to_string_lossy().ends_with(".zip"))
        .collect();
    build_zip(root, &files, dest)
}

fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| Error::Packaging(format!("{:?} is outside the workspace", path)))?;
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

fn packaging_io(action: &str, path: &Path, e: io::Error) -> Error {
    Error::Packaging(format!("failed to {} {:?}: {}", action, path, e))
}
