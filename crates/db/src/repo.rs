//! Staging and reconciliation against the reference table.
//!
//! The reference table `product_images` is owned jointly with the product
//! catalog: the catalog reads it, this crate is its sole writer. All writing
//! goes through [`Repository::sync`], which replaces the staging table and
//! reconciles the reference table inside a single transaction; a crash at
//! any point leaves the reference table in its prior committed state.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{ImageEntry, ImageRow};
use exn::ResultExt;
use imagesync_scan::Snapshot;
use sqlx::SqlitePool;

/// Row counts from one reconciliation, for the log line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Rows bulk-inserted into staging (equals the snapshot size).
    pub staged: u64,
    /// Reference rows inserted or actually updated by the merge. Rows whose
    /// extension and timestamp already matched are not counted.
    pub upserted: u64,
    /// Reference rows deleted because their product vanished from disk.
    pub deleted: u64,
}

/// Repository over the reference and staging tables.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    // =========================================================================
    // Staging + reconcile
    // =========================================================================

    /// Replace the staging table with the snapshot and reconcile the
    /// reference table against it, as one atomic unit.
    ///
    /// Set semantics keyed on `codprod`:
    /// - present in both, values differ → reference row updated;
    /// - present only in the snapshot → reference row inserted;
    /// - present only in the reference table → reference row deleted.
    ///
    /// Commits only after every statement succeeded. Any failure drops the
    /// transaction un-committed, so a half-staged snapshot can never be
    /// reconciled against.
    ///
    /// An empty snapshot is honored literally and empties the reference
    /// table; whether to call `sync` at all in that case is the caller's
    /// policy decision.
    pub async fn sync(&self, snapshot: &Snapshot) -> Result<SyncReport> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;

        sqlx::query(include_str!("../queries/clear_staging.sql"))
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tracing::info!("staging table cleared");

        let mut staged = 0;
        for (codprod, entry) in snapshot.iter() {
            sqlx::query(include_str!("../queries/insert_staging.sql"))
                .bind(codprod)
                .bind(&entry.extensao)
                .bind(entry.modified_at.unix_timestamp())
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            staged += 1;
        }
        tracing::info!(rows = staged, "snapshot staged");

        let upserted = sqlx::query(include_str!("../queries/merge_target.sql"))
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?
            .rows_affected();
        tracing::info!(rows = upserted, "merge into reference table executed");

        let deleted = sqlx::query(include_str!("../queries/delete_orphans.sql"))
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?
            .rows_affected();
        tracing::info!(rows = deleted, "orphaned reference rows deleted");

        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(SyncReport { staged, upserted, deleted })
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    /// All reference rows, ordered by product code.
    pub async fn all(&self) -> Result<Vec<ImageEntry>> {
        let rows: Vec<ImageRow> = sqlx::query_as(include_str!("../queries/select_all.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(ImageEntry::try_from).collect()
    }

    /// A single reference row by product code.
    pub async fn get(&self, codprod: i64) -> Result<Option<ImageEntry>> {
        let row: Option<ImageRow> = sqlx::query_as(include_str!("../queries/select_one.sql"))
            .bind(codprod)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(ImageEntry::try_from).transpose()
    }

    /// Number of rows currently staged. After a successful [`sync`](Self::sync)
    /// this equals the snapshot size, until the next pass replaces it.
    pub async fn staging_count(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM product_images_staging")
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.0 as u64)
    }
}
