use crate::record::FileRecord;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use time::OffsetDateTime;

/// The canonical per-product view of the repository: at most one entry per
/// product code.
///
/// Built fresh every pass by [`Snapshot::reduce`]; never persisted in this form
/// (the staging table mirrors it on the database side).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: HashMap<i64, SnapshotEntry>,
}

/// The winning extension/timestamp pair for one product code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub extensao: String,
    pub modified_at: OffsetDateTime,
}
impl From<FileRecord> for SnapshotEntry {
    fn from(record: FileRecord) -> Self {
        Self { extensao: record.extensao, modified_at: record.modified_at }
    }
}

impl Snapshot {
    /// Collapse raw records into one entry per product code.
    ///
    /// Single pass, O(N) time, O(distinct codes) space. The most recently
    /// modified file wins; when two files share both code and modification
    /// time, the one observed later in the listing wins. Directory
    /// enumeration order is not stable across platforms, so exact-tie
    /// duplicates (say, `300.jpg` and `300.png` written in the same second)
    /// may flip between passes. The reconciler turns such a flip into one
    /// UPDATE, nothing worse.
    pub fn reduce(records: impl IntoIterator<Item = FileRecord>) -> Self {
        let mut entries: HashMap<i64, SnapshotEntry> = HashMap::new();
        for record in records {
            match entries.entry(record.codprod) {
                Entry::Vacant(slot) => {
                    slot.insert(record.into());
                },
                Entry::Occupied(mut slot) if record.modified_at >= slot.get().modified_at => {
                    slot.insert(record.into());
                },
                Entry::Occupied(_) => {},
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, codprod: i64) -> Option<&SnapshotEntry> {
        self.entries.get(&codprod)
    }

    /// Iterate over entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &SnapshotEntry)> {
        self.entries.iter().map(|(codprod, entry)| (*codprod, entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn record(codprod: i64, extensao: &str, offset_secs: i64) -> FileRecord {
        FileRecord {
            codprod,
            extensao: extensao.to_string(),
            modified_at: OffsetDateTime::UNIX_EPOCH + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn test_empty_input() {
        let snapshot = Snapshot::reduce([]);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
    }

    #[test]
    fn test_distinct_codes_all_survive() {
        let snapshot = Snapshot::reduce([record(1, "jpg", 0), record(2, "png", 0), record(3, "gif", 0)]);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.get(2).unwrap().extensao, "png");
    }

    #[test]
    fn test_latest_modification_wins() {
        let snapshot = Snapshot::reduce([record(300, "jpg", 100), record(300, "png", 200)]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(300).unwrap().extensao, "png");
        // ... and in the other listing order.
        let snapshot = Snapshot::reduce([record(300, "png", 200), record(300, "jpg", 100)]);
        assert_eq!(snapshot.get(300).unwrap().extensao, "png");
    }

    #[test]
    fn test_winner_timestamp_is_the_maximum() {
        let records = [record(7, "a", 50), record(7, "b", 300), record(7, "c", 200)];
        let max = records.iter().map(|r| r.modified_at).max().unwrap();
        let snapshot = Snapshot::reduce(records);
        assert_eq!(snapshot.get(7).unwrap().modified_at, max);
    }

    #[test]
    fn test_exact_tie_last_observed_wins() {
        let snapshot = Snapshot::reduce([record(5, "jpg", 100), record(5, "png", 100)]);
        assert_eq!(snapshot.get(5).unwrap().extensao, "png");
    }
}
