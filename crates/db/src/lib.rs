//! SQLite reference database for imagesync.
//!
//! [`Database`] manages the connection pool and schema; [`Repository`] stages
//! directory snapshots and reconciles the `product_images` reference table
//! against them transactionally.

mod db;
pub mod error;
mod models;
mod repo;

pub use self::db::Database;
pub use self::models::ImageEntry;
pub use self::repo::{Repository, SyncReport};
