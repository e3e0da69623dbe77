//! Directory scanner for the mounted image repository.
//!
//! Reads filenames and modification metadata only, never file contents. The
//! repository is a flat directory: subdirectories are not descended into.

use crate::error::{ErrorKind, Result};
use crate::record::FileRecord;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;
use tokio::fs;

/// Enumerate the repository directory and produce one [`FileRecord`] per
/// valid entry.
///
/// Three kinds of entry never make it into the result:
/// - anything that does not resolve to a regular file (directories, broken
///   symlinks, sockets); symlinks are followed, so a link to an image file
///   counts as that file;
/// - files whose stem is not a product code, logged at info level;
/// - files whose name is not valid UTF-8 (cannot be a product code either).
///
/// A missing or unreadable mount point is an operational condition, not an
/// error: the NFS share comes and goes. It yields a warning and an empty
/// listing so the pass can carry on. Every other I/O failure while listing
/// aborts the current pass.
pub async fn scan_dir(dir: &Path) -> Result<Vec<FileRecord>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if matches!(err.kind(), IoErrorKind::NotFound | IoErrorKind::PermissionDenied) => {
            tracing::warn!(dir = %dir.display(), error = %err, "repository not found or not mounted");
            return Ok(Vec::new());
        },
        Err(err) => return Err(ErrorKind::Io(err).into()),
    };

    let mut records = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(ErrorKind::Io)? {
        // fs::metadata (unlike DirEntry::metadata) follows symlinks, so the
        // file-type check and the modification time both apply to the link
        // target. A dangling link races against whatever removed its target;
        // drop it like any other non-file.
        let metadata = match fs::metadata(entry.path()).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == IoErrorKind::NotFound => continue,
            Err(err) => return Err(ErrorKind::Io(err).into()),
        };
        if !metadata.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            tracing::info!(file = ?entry.file_name(), "ignoring file with non-UTF-8 name");
            continue;
        };
        let modified_at = metadata.modified().map_err(ErrorKind::Io)?.into();
        match FileRecord::from_file_name(name, modified_at) {
            Some(record) => records.push(record),
            None => tracing::info!(file = name, "ignoring file without a numeric stem"),
        }
    }
    Ok(records)
}
