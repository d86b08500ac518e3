//! Snapshot types: the full state of one replica.
//!
//! A snapshot is the unit the merge engine works on and the payload written to
//! the remote store. On the wire it is a plain JSON array of records.

use crate::{error::Result, Error, Record, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All records of one replica, keyed by id.
///
/// Uses BTreeMap instead of HashMap for deterministic serialization order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: BTreeMap<RecordId, Record>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from a list that may repeat ids.
    ///
    /// A repeated id keeps the copy with the greater `updatedAt`, the later
    /// copy on a tie.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut snapshot = Self::new();
        for record in records {
            snapshot.insert_newer(record);
        }
        snapshot
    }

    /// Insert a record, replacing any record with the same id.
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        self.records.insert(record.id.clone(), record)
    }

    /// Insert a record unless the existing copy was modified later.
    ///
    /// Returns whether the record was stored.
    pub fn insert_newer(&mut self, record: Record) -> bool {
        match self.records.get(&record.id) {
            Some(existing) if existing.modified_at() > record.modified_at() => false,
            _ => {
                self.insert(record);
                true
            }
        }
    }

    /// Get a record by id.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    /// Check if a record exists (including tombstones).
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Keep only the records matching the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&Record) -> bool) {
        self.records.retain(|_, record| keep(record));
    }

    /// All records including tombstones, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Records that are not tombstones.
    pub fn active(&self) -> impl Iterator<Item = &Record> {
        self.records.values().filter(|r| r.is_active())
    }

    /// Record ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.records.keys()
    }

    /// Count total records including tombstones.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the snapshot holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize to pretty JSON (two-space indentation).
    pub fn to_json_pretty(&self) -> Result<String> {
        let records: Vec<&Record> = self.iter().collect();
        serde_json::to_string_pretty(&records).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Deserialize from a JSON array of records.
    ///
    /// Every record must carry a non-empty id.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<Record> =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;

        if let Some(position) = records.iter().position(|r| r.id.trim().is_empty()) {
            return Err(Error::InvalidSnapshot(format!(
                "record at index {position} has no id"
            )));
        }

        Ok(Self::from_records(records))
    }
}

impl FromIterator<Record> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::from_records(iter)
    }
}

impl IntoIterator for Snapshot {
    type Item = Record;
    type IntoIter = std::collections::btree_map::IntoValues<RecordId, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_values()
    }
}

/// Counts describing a snapshot (without the full data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    /// Total record count, tombstones included
    pub record_count: usize,
    /// Records that are not deleted
    pub active_count: usize,
    /// Tombstones still inside the retention window
    pub tombstone_count: usize,
}

impl From<&Snapshot> for SnapshotSummary {
    fn from(snapshot: &Snapshot) -> Self {
        let active_count = snapshot.active().count();
        Self {
            record_count: snapshot.len(),
            active_count,
            tombstone_count: snapshot.len() - active_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Timestamp;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Map, Value};

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn fields(title: &str) -> Map<String, Value> {
        json!({ "title": title }).as_object().unwrap().clone()
    }

    #[test]
    fn create_empty_snapshot() {
        let snapshot = Snapshot::new();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
        assert_eq!(snapshot.to_json_pretty().unwrap(), "[]");
    }

    #[test]
    fn duplicate_ids_keep_newest() {
        let snapshot = Snapshot::from_records(vec![
            Record::new("b1", fields("new"), at(2000)),
            Record::new("b1", fields("old"), at(1000)),
        ]);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("b1").unwrap().text("title"), Some("new"));
    }

    #[test]
    fn duplicate_ids_tie_keeps_later() {
        let snapshot = Snapshot::from_records(vec![
            Record::new("b1", fields("first"), at(1000)),
            Record::new("b1", fields("second"), at(1000)),
        ]);

        assert_eq!(snapshot.get("b1").unwrap().text("title"), Some("second"));
    }

    #[test]
    fn deterministic_serialization() {
        let a = Record::new("a", fields("A"), at(1));
        let b = Record::new("b", fields("B"), at(1));

        let one = Snapshot::from_records(vec![a.clone(), b.clone()]);
        let two = Snapshot::from_records(vec![b, a]);

        assert_eq!(one.to_json_pretty().unwrap(), two.to_json_pretty().unwrap());
    }

    #[test]
    fn pretty_json_uses_two_spaces() {
        let snapshot = Snapshot::from_records(vec![Record::new("a", fields("A"), at(0))]);
        let json = snapshot.to_json_pretty().unwrap();

        assert!(json.starts_with("[\n  {\n    \"id\": \"a\""));
    }

    #[test]
    fn from_json_reads_array() {
        let json = r#"[
            {"id": "a", "title": "A", "updatedAt": "2024-01-01T00:00:00.000Z"},
            {"id": "b", "title": "B", "deletedAt": "2024-01-02T00:00:00.000Z"}
        ]"#;
        let snapshot = Snapshot::from_json(json).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.active().count(), 1);
        assert!(snapshot.get("b").unwrap().is_tombstone());
    }

    #[test]
    fn from_json_rejects_non_array() {
        let result = Snapshot::from_json(r#"{"books": []}"#);
        assert!(matches!(result, Err(Error::InvalidSnapshot(_))));
    }

    #[test]
    fn from_json_rejects_missing_id() {
        let result = Snapshot::from_json(r#"[{"title": "anonymous"}]"#);
        assert!(matches!(result, Err(Error::InvalidSnapshot(_))));
    }

    #[test]
    fn summary_counts() {
        let mut deleted = Record::new("b", fields("B"), at(1));
        deleted.mark_deleted(at(2));
        let snapshot =
            Snapshot::from_records(vec![Record::new("a", fields("A"), at(1)), deleted]);

        let summary = SnapshotSummary::from(&snapshot);
        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.active_count, 1);
        assert_eq!(summary.tombstone_count, 1);
    }
}
