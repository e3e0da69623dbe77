//! One full reconciliation pass: scan → reduce → stage + reconcile.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use imagesync_config::Config;
use imagesync_db::{Database, Repository, SyncReport};
use imagesync_scan::{Snapshot, scan_dir};

/// What one pass did, for the closing log line.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassReport {
    /// Raw files accepted by the scanner.
    pub raw: usize,
    /// Distinct products after reduction.
    pub unique: usize,
    /// Database work performed, or `None` when the pass was skipped because
    /// the listing was empty.
    pub synced: Option<SyncReport>,
}

/// Run a single reconciliation pass.
///
/// An empty listing skips the database step entirely instead of deleting
/// every reference row: the usual cause is a transiently unmounted share,
/// and stale rows are preferable to an emptied catalog. The connection pool
/// is always closed before returning, error or not.
pub async fn run_pass(config: &Config) -> Result<PassReport> {
    tracing::info!("starting repository reconciliation pass");

    let records = scan_dir(&config.repository.mount_point).await.or_raise(|| ErrorKind::Scan)?;
    if records.is_empty() {
        tracing::info!("no image files found; leaving the reference table untouched");
        return Ok(PassReport::default());
    }
    let raw = records.len();
    tracing::info!(count = raw, "image files found in the repository");

    let snapshot = Snapshot::reduce(records);
    tracing::info!(count = snapshot.len(), "unique products after deduplication");

    let db = Database::connect(&config.database.path).await.or_raise(|| ErrorKind::Database)?;
    let synced = Repository::from(&db).sync(&snapshot).await.or_raise(|| ErrorKind::Database);
    db.close().await;
    tracing::info!("database connection closed");

    Ok(PassReport { raw, unique: snapshot.len(), synced: Some(synced?) })
}
