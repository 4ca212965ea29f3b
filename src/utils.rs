//! Utility functions for file operations and response headers

use crate::error::{Error, Result};
use rand::Rng;
use std::path::{Path, PathBuf};

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Get a path that does not exist yet, adding ` (1)`, ` (2)`, ... before the extension
///
/// # Examples
///
/// ```
/// use bakraload::utils::get_unique_path;
/// use std::path::Path;
///
/// let path = Path::new("/nonexistent-dir/video.mp4");
/// assert_eq!(get_unique_path(path).unwrap(), path);
/// ```
pub fn get_unique_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Internal(format!("cannot extract file stem from {:?}", path)))?;
    let extension = path.extension().and_then(|e| e.to_str());
    let parent = path
        .parent()
        .ok_or_else(|| Error::Internal(format!("cannot extract parent of {:?}", path)))?;

    for i in 1..=MAX_RENAME_ATTEMPTS {
        let new_name = match extension {
            Some(ext) => format!("{} ({}).{}", stem, i, ext),
            None => format!("{} ({})", stem, i),
        };
        let new_path = parent.join(new_name);
        if !new_path.exists() {
            return Ok(new_path);
        }
    }

    Err(Error::Internal(format!(
        "could not find unique filename for {:?} after {} attempts",
        path, MAX_RENAME_ATTEMPTS
    )))
}

/// Move a file into `dest_dir`, keeping its file name and never overwriting
///
/// Falls back to copy + remove when a plain rename is not possible
/// (e.g., across filesystems). Returns the final path.
pub fn move_into_dir(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let file_name = src
        .file_name()
        .ok_or_else(|| Error::Internal(format!("no file name in {:?}", src)))?;
    let dest = get_unique_path(&dest_dir.join(file_name))?;

    if std::fs::rename(src, &dest).is_err() {
        std::fs::copy(src, &dest)?;
        std::fs::remove_file(src)?;
    }

    Ok(dest)
}

/// Random uppercase hexadecimal token of `len` characters
///
/// # Examples
///
/// ```
/// use bakraload::utils::random_hex_token;
///
/// let token = random_hex_token(6);
/// assert_eq!(token.len(), 6);
/// assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
/// ```
pub fn random_hex_token(len: usize) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(HEX[rng.gen_range(0..HEX.len())]))
        .collect()
}

/// Build a `Content-Disposition: attachment` value for `filename`
///
/// Emits an ASCII fallback in `filename=` and the exact UTF-8 name in
/// `filename*=` (RFC 5987), so non-ASCII titles survive in modern clients.
///
/// # Examples
///
/// ```
/// use bakraload::utils::content_disposition;
///
/// assert_eq!(
///     content_disposition("clip.mp4"),
///     "attachment; filename=\"clip.mp4\"; filename*=UTF-8''clip.mp4"
/// );
/// ```
pub fn content_disposition(filename: &str) -> String {
    let ascii_fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | ' ' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback,
        urlencoding::encode(filename)
    )
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn unique_path_returns_original_when_free() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("video.mp4");
        assert_eq!(get_unique_path(&path).unwrap(), path);
    }

    #[test]
    fn unique_path_appends_counter_before_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("video.mp4");
        fs::write(&path, b"a").unwrap();
        fs::write(temp.path().join("video (1).mp4"), b"b").unwrap();

        assert_eq!(
            get_unique_path(&path).unwrap(),
            temp.path().join("video (2).mp4")
        );
    }

    #[test]
    fn unique_path_handles_missing_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("README");
        fs::write(&path, b"a").unwrap();
        assert_eq!(get_unique_path(&path).unwrap(), temp.path().join("README (1)"));
    }

    #[test]
    fn move_into_dir_flattens_and_avoids_overwrite() {
        let temp = TempDir::new().unwrap();
        let src_dir = temp.path().join("src/nested");
        let dest_dir = temp.path().join("dest");
        fs::create_dir_all(&src_dir).unwrap();
        fs::create_dir_all(&dest_dir).unwrap();

        fs::write(dest_dir.join("clip.mp4"), b"existing").unwrap();
        fs::write(src_dir.join("clip.mp4"), b"incoming").unwrap();

        let moved = move_into_dir(&src_dir.join("clip.mp4"), &dest_dir).unwrap();
        assert_eq!(moved, dest_dir.join("clip (1).mp4"));
        assert_eq!(fs::read(&moved).unwrap(), b"incoming");
        assert_eq!(fs::read(dest_dir.join("clip.mp4")).unwrap(), b"existing");
        assert!(!src_dir.join("clip.mp4").exists());
    }

    #[test]
    fn random_tokens_are_uppercase_hex() {
        for _ in 0..100 {
            let token = random_hex_token(6);
            assert_eq!(token.len(), 6);
            assert!(token.chars().all(|c| matches!(c, '0'..='9' | 'A'..='F')));
        }
    }

    #[test]
    fn content_disposition_encodes_non_ascii() {
        let value = content_disposition("Vidéo: \"best\".mp4");
        assert!(value.starts_with("attachment; filename=\"Vid_o_ _best_.mp4\""));
        assert!(value.contains("filename*=UTF-8''Vid%C3%A9o%3A%20%22best%22.mp4"));
        assert!(axum::http::HeaderValue::from_str(&value).is_ok());
    }
}
