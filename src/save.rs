//! Writing validated images to disk.
//!
//! Writes are plain create-or-truncate writes, not atomic renames. If a write
//! fails after the file was created, the partial file is removed so a failed
//! save never leaves anything behind.

use crate::types::{SaveFailure, SaveResult, SavedFile};
use crate::utils::is_writable;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Settings that shape a single save
#[derive(Clone, Copy, Debug, Default)]
pub struct SaveOptions<'a> {
    /// Refuse payloads larger than this many bytes
    pub max_file_bytes: Option<u64>,
    /// Document root used to derive a public path for the saved file
    pub document_root: Option<&'a Path>,
}

/// Write `data` to `path` and verify the result on disk
///
/// After a successful write the file is stat-ed again to compare the on-disk
/// size with `data.len()`. A mismatch is recorded in
/// [`SavedFile::sizes_match`] and does not turn the save into a failure.
pub async fn save_image(path: &Path, data: &[u8], options: &SaveOptions<'_>) -> SaveResult {
    if let Some(limit) = options.max_file_bytes
        && data.len() as u64 > limit
    {
        let message = format!(
            "image is {} bytes, above the {} byte save limit",
            data.len(),
            limit
        );
        return SaveResult::Failed(failure(path, message));
    }

    let bytes_written = match write_file(path, data).await {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "save failed");
            return SaveResult::Failed(failure(path, e.to_string()));
        }
    };

    let (path_exists, disk_size) = match tokio::fs::metadata(path).await {
        Ok(meta) => (true, meta.len()),
        Err(_) => (false, 0),
    };
    let sizes_match = disk_size == data.len() as u64;
    if !sizes_match {
        tracing::warn!(
            path = %path.display(),
            expected = data.len(),
            on_disk = disk_size,
            "size on disk differs from downloaded size"
        );
    }

    let web_path = options
        .document_root
        .and_then(|root| web_path_under(root, path));

    tracing::info!(path = %path.display(), bytes = bytes_written, "saved");

    SaveResult::Saved(SavedFile {
        bytes_written,
        path_exists,
        disk_size,
        sizes_match,
        full_path: path.to_path_buf(),
        web_path,
    })
}

async fn write_file(path: &Path, data: &[u8]) -> std::io::Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;

    let written = async {
        file.write_all(data).await?;
        file.flush().await?;
        file.sync_all().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            tracing::debug!(path = %path.display(), error = %remove_err, "could not remove partial file");
        }
        return Err(e);
    }

    Ok(data.len() as u64)
}

fn failure(path: &Path, error: String) -> SaveFailure {
    let dir = parent_dir(path);
    SaveFailure {
        error,
        dir_exists: dir.is_dir(),
        dir_writable: is_writable(&dir),
        full_path: path.to_path_buf(),
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Public path of `file` below `document_root`
///
/// Both paths are resolved first, so symlinks and `..` cannot escape the
/// root. The result always starts with `/` and uses `/` as separator on
/// every platform. Returns `None` when either path cannot be resolved or the
/// file is not inside the root.
pub fn web_path_under(document_root: &Path, file: &Path) -> Option<String> {
    let root = std::fs::canonicalize(document_root).ok()?;
    let file = std::fs::canonicalize(file).ok()?;
    let relative = file.strip_prefix(&root).ok()?;

    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    Some(format!("/{}", segments.join("/")))
}
