//! Directory scanning and snapshot reduction for the imagesync service.
//!
//! One reconciliation pass starts here: [`scan_dir`] turns the mounted
//! repository into raw [`FileRecord`]s, and [`Snapshot::reduce`] collapses
//! them into the canonical one-entry-per-product view that the database
//! crate stages and reconciles.

pub mod error;
mod record;
mod scan;
mod snapshot;

pub use self::record::{FileRecord, has_numeric_stem};
pub use self::scan::scan_dir;
pub use self::snapshot::{Snapshot, SnapshotEntry};
