//! The local record store contract.

use crate::error::StoreResult;
use async_trait::async_trait;
use boeklog_engine::{Record, Snapshot, Timestamp};

/// Generate a fresh record id.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Persistent keyed collection of books with soft delete.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records; tombstones only when `include_deleted` is set.
    ///
    /// Active listings come back newest `readDate` first. Books without a
    /// `readDate` sort last, by id.
    async fn get_all(&self, include_deleted: bool) -> StoreResult<Vec<Record>>;

    /// Get a record by id, tombstones included.
    async fn get(&self, id: &str) -> StoreResult<Option<Record>>;

    /// Insert or overwrite a record as is.
    async fn upsert(&self, record: &Record) -> StoreResult<()>;

    /// Hard delete. Returns whether a record was removed.
    async fn delete(&self, id: &str) -> StoreResult<bool>;

    /// Clear the store and insert the snapshot, atomically.
    async fn replace_all(&self, snapshot: &Snapshot) -> StoreResult<()>;

    /// Bulk import: assigns missing ids and stamps every record with `now`.
    async fn save_many(&self, records: Vec<Record>, now: Timestamp) -> StoreResult<usize>;

    /// Save a user edit: assigns an id if missing and stamps `updatedAt`.
    async fn save(&self, mut record: Record, now: Timestamp) -> StoreResult<Record> {
        if record.id.trim().is_empty() {
            record.id = new_record_id();
        }
        record.touch(now);
        self.upsert(&record).await?;
        Ok(record)
    }

    /// Turn a record into a tombstone. Returns `false` when the id is unknown.
    async fn soft_delete(&self, id: &str, now: Timestamp) -> StoreResult<bool> {
        match self.get(id).await? {
            Some(mut record) => {
                record.mark_deleted(now);
                self.upsert(&record).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The full local replica, tombstones included.
    async fn snapshot(&self) -> StoreResult<Snapshot> {
        Ok(Snapshot::from_records(self.get_all(true).await?))
    }
}
