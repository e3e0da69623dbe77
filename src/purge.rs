//! Repository sweep: delete files that are not product images.
//!
//! One-off maintenance utility, not part of the recurring pass. Anything
//! whose filename stem is not a product code gets deleted (or merely listed
//! in dry-run mode). The scanner would have ignored these files anyway; this
//! exists to keep the mount from silting up with strays.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use imagesync_scan::has_numeric_stem;
use std::path::Path;
use tokio::fs;

/// Outcome of one sweep.
#[derive(Clone, Copy, Debug, Default)]
pub struct PurgeReport {
    /// Non-numeric files found (and, unless dry-run, deleted).
    pub matched: usize,
    /// Files that matched but could not be deleted.
    pub failed: usize,
}

/// Sweep the repository directory once.
///
/// Unlike the scanner, a missing directory *is* an error here: someone asked
/// for a sweep, and sweeping nothing is not what they meant. Individual
/// deletion failures are logged and counted, not fatal.
pub async fn purge(dir: &Path, dry_run: bool) -> Result<PurgeReport> {
    let mut entries = fs::read_dir(dir).await.or_raise(|| ErrorKind::Purge)?;
    let mut report = PurgeReport::default();
    while let Some(entry) = entries.next_entry().await.or_raise(|| ErrorKind::Purge)? {
        let metadata = entry.metadata().await.or_raise(|| ErrorKind::Purge)?;
        if !metadata.is_file() {
            continue;
        }
        let name = entry.file_name();
        // Non-UTF-8 names can't be product codes either; they're strays too.
        if name.to_str().is_some_and(has_numeric_stem) {
            continue;
        }
        report.matched += 1;
        if dry_run {
            tracing::info!(file = ?name, "would delete non-numeric file (dry run)");
            continue;
        }
        match fs::remove_file(entry.path()).await {
            Ok(()) => tracing::info!(file = ?name, "deleted non-numeric file"),
            Err(err) => {
                report.failed += 1;
                tracing::warn!(file = ?name, error = %err, "failed to delete non-numeric file");
            },
        }
    }
    tracing::info!(matched = report.matched, failed = report.failed, dry_run, "repository sweep finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn populate(dir: &Path) {
        for name in ["100.jpg", "200.png", "abc.jpg", "Thumbs.db", "300"] {
            File::create(dir.join(name)).unwrap();
        }
    }

    #[tokio::test]
    async fn test_deletes_only_non_numeric_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        populate(temp_dir.path());

        let report = purge(temp_dir.path(), false).await.unwrap();
        assert_eq!(report.matched, 2);
        assert_eq!(report.failed, 0);
        assert!(temp_dir.path().join("100.jpg").exists());
        assert!(temp_dir.path().join("300").exists());
        assert!(!temp_dir.path().join("abc.jpg").exists());
        assert!(!temp_dir.path().join("Thumbs.db").exists());
    }

    #[tokio::test]
    async fn test_dry_run_deletes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        populate(temp_dir.path());

        let report = purge(temp_dir.path(), true).await.unwrap();
        assert_eq!(report.matched, 2);
        assert!(temp_dir.path().join("abc.jpg").exists());
        assert!(temp_dir.path().join("Thumbs.db").exists());
    }

    #[tokio::test]
    async fn test_directories_are_left_alone() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(temp_dir.path().join("not-numeric-dir")).unwrap();

        let report = purge(temp_dir.path(), false).await.unwrap();
        assert_eq!(report.matched, 0);
        assert!(temp_dir.path().join("not-numeric-dir").exists());
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        assert!(purge(Path::new("/definitely/not/mounted/here"), false).await.is_err());
    }
}
