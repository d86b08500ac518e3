//! SQLite-backed record store.

use super::pool::{create_pool, run_migrations, Pool};
use super::store::{new_record_id, RecordStore};
use crate::error::StoreResult;
use async_trait::async_trait;
use boeklog_engine::{Record, Snapshot, Timestamp};
use chrono::SecondsFormat;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};

/// A stored book row from the database.
#[derive(Debug)]
pub struct StoredBook {
    pub id: String,
    pub body: String,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for StoredBook {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(StoredBook {
            id: row.try_get("id")?,
            body: row.try_get("body")?,
        })
    }
}

impl StoredBook {
    /// Convert database row to an engine Record.
    pub fn to_record(&self) -> serde_json::Result<Record> {
        let mut record: Record = serde_json::from_str(&self.body)?;
        record.id.clone_from(&self.id);
        Ok(record)
    }
}

/// The local catalogue in SQLite.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool,
}

impl SqliteStore {
    /// Wrap an existing, migrated pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database and run migrations.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    async fn fetch(&self, sql: &str) -> StoreResult<Vec<Record>> {
        let rows = sqlx::query_as::<_, StoredBook>(sql)
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(row.to_record()?);
        }
        Ok(records)
    }
}

fn format_ts(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Upsert a record on any executor (pool or transaction).
async fn upsert_record<'e, E>(executor: E, record: &Record) -> StoreResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let body = serde_json::to_string(record)?;

    sqlx::query(
        r#"
        INSERT INTO books (id, read_date, updated_at, deleted_at, body)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE SET
            read_date = excluded.read_date,
            updated_at = excluded.updated_at,
            deleted_at = excluded.deleted_at,
            body = excluded.body
        "#,
    )
    .bind(&record.id)
    .bind(record.text("readDate"))
    .bind(record.updated_at.as_ref().map(format_ts))
    .bind(record.deleted_at.as_ref().map(format_ts))
    .bind(body)
    .execute(executor)
    .await?;

    Ok(())
}

async fn insert_all(tx: &mut Transaction<'_, Sqlite>, records: &[Record]) -> StoreResult<()> {
    for record in records {
        upsert_record(&mut **tx, record).await?;
    }
    Ok(())
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get_all(&self, include_deleted: bool) -> StoreResult<Vec<Record>> {
        if include_deleted {
            self.fetch("SELECT id, body FROM books ORDER BY id")
                .await
        } else {
            self.fetch(
                r#"
                SELECT id, body FROM books
                WHERE deleted_at IS NULL
                ORDER BY read_date DESC, id ASC
                "#,
            )
            .await
        }
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Record>> {
        let row = sqlx::query_as::<_, StoredBook>(
            "SELECT id, body FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.to_record()).transpose()?)
    }

    async fn upsert(&self, record: &Record) -> StoreResult<()> {
        upsert_record(&self.pool, record).await
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn replace_all(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let records: Vec<Record> = snapshot.iter().cloned().collect();

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM books").execute(&mut *tx).await?;
        insert_all(&mut tx, &records).await?;
        tx.commit().await?;

        tracing::debug!(records = records.len(), "Replaced local store");
        Ok(())
    }

    async fn save_many(&self, records: Vec<Record>, now: Timestamp) -> StoreResult<usize> {
        let records: Vec<Record> = records
            .into_iter()
            .map(|mut record| {
                if record.id.trim().is_empty() {
                    record.id = new_record_id();
                }
                record.touch(now);
                record
            })
            .collect();

        let mut tx = self.pool.begin().await?;
        insert_all(&mut tx, &records).await?;
        tx.commit().await?;

        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};
    use serde_json::{json, Map, Value};

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn fields(title: &str, read_date: &str) -> Map<String, Value> {
        json!({"title": title, "author": "A", "readDate": read_date})
            .as_object()
            .unwrap()
            .clone()
    }

    async fn store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn save_assigns_id_and_timestamp() {
        let store = store().await;
        let saved = store
            .save(Record::new("", fields("Nooit meer slapen", "2024-03-01"), at(1)), at(50))
            .await
            .unwrap();

        assert!(!saved.id.is_empty());
        assert_eq!(saved.updated_at, Some(at(50)));
        assert_eq!(store.get(&saved.id).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn save_keeps_existing_id() {
        let store = store().await;
        let saved = store
            .save(Record::new("b1", fields("X", "2024-01-01"), at(1)), at(2))
            .await
            .unwrap();
        assert_eq!(saved.id, "b1");
    }

    #[tokio::test]
    async fn active_listing_sorted_by_read_date() {
        let store = store().await;
        for (id, date) in [("a", "2023-05-01"), ("b", "2024-02-01"), ("c", "2023-12-24")] {
            store
                .save(Record::new(id, fields(id, date), at(1)), at(1))
                .await
                .unwrap();
        }

        let ids: Vec<String> = store
            .get_all(false)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn books_without_read_date_sort_last() {
        let store = store().await;
        let undated = json!({"title": "Undated"}).as_object().unwrap().clone();
        store
            .save(Record::new("z", undated.clone(), at(1)), at(1))
            .await
            .unwrap();
        store
            .save(Record::new("m", undated, at(1)), at(1))
            .await
            .unwrap();
        store
            .save(Record::new("a", fields("a", "2020-01-01"), at(1)), at(1))
            .await
            .unwrap();

        let ids: Vec<String> = store
            .get_all(false)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "m", "z"]);
    }

    #[tokio::test]
    async fn soft_delete_hides_but_keeps() {
        let store = store().await;
        store
            .save(Record::new("b1", fields("X", "2024-01-01"), at(1)), at(1))
            .await
            .unwrap();

        assert!(store.soft_delete("b1", at(10)).await.unwrap());
        assert!(!store.soft_delete("missing", at(10)).await.unwrap());

        assert!(store.get_all(false).await.unwrap().is_empty());
        let all = store.get_all(true).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].deleted_at, Some(at(10)));
        assert_eq!(all[0].updated_at, Some(at(10)));
    }

    #[tokio::test]
    async fn hard_delete_removes() {
        let store = store().await;
        store
            .save(Record::new("b1", fields("X", "2024-01-01"), at(1)), at(1))
            .await
            .unwrap();

        assert!(store.delete("b1").await.unwrap());
        assert!(!store.delete("b1").await.unwrap());
        assert!(store.get_all(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_all_supersedes_contents() {
        let store = store().await;
        store
            .save(Record::new("old", fields("Old", "2020-01-01"), at(1)), at(1))
            .await
            .unwrap();

        let mut tombstone = Record::new("gone", fields("Gone", "2021-01-01"), at(5));
        tombstone.mark_deleted(at(6));
        let snapshot = Snapshot::from_records(vec![
            Record::new("new", fields("New", "2024-01-01"), at(5)),
            tombstone,
        ]);

        store.replace_all(&snapshot).await.unwrap();

        assert_eq!(store.snapshot().await.unwrap(), snapshot);
        assert!(store.get("old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_many_refreshes_timestamps() {
        let store = store().await;
        let mut legacy: Record = serde_json::from_value(json!({"title": "No id"})).unwrap();
        legacy.updated_at = None;
        let records = vec![legacy, Record::new("b2", fields("B", "2024-01-01"), at(1))];

        let now = at(1) + TimeDelta::days(3);
        assert_eq!(store.save_many(records, now).await.unwrap(), 2);

        let all = store.get_all(true).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| r.updated_at == Some(now) && !r.id.is_empty()));
    }

    #[tokio::test]
    async fn file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("boeklog.db").display());

        {
            let store = SqliteStore::connect(&url).await.unwrap();
            store
                .save(Record::new("b1", fields("Persisted", "2024-01-01"), at(1)), at(1))
                .await
                .unwrap();
            store.pool().close().await;
        }

        let store = SqliteStore::connect(&url).await.unwrap();
        let record = store.get("b1").await.unwrap().unwrap();
        assert_eq!(record.text("title"), Some("Persisted"));
    }
}
