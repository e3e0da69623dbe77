use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use imagesync_scan::SnapshotEntry;
use time::OffsetDateTime;

/// A `product_images` row as stored: timestamps are unix seconds.
#[derive(sqlx::FromRow)]
pub(crate) struct ImageRow {
    pub(crate) codprod: i64,
    pub(crate) extensao: String,
    pub(crate) dta_atualizacao: i64,
}

/// One product's image as recorded in the reference table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageEntry {
    pub codprod: i64,
    pub extensao: String,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<ImageRow> for ImageEntry {
    type Error = Error;
    fn try_from(row: ImageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            codprod: row.codprod,
            extensao: row.extensao,
            updated_at: OffsetDateTime::from_unix_timestamp(row.dta_atualizacao)
                .or_raise(|| ErrorKind::InvalidData("update timestamp"))?,
        })
    }
}

impl From<(i64, &SnapshotEntry)> for ImageEntry {
    fn from((codprod, entry): (i64, &SnapshotEntry)) -> Self {
        Self { codprod, extensao: entry.extensao.clone(), updated_at: entry.modified_at }
    }
}
