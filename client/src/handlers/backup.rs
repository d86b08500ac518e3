//! JSON backup export and import.

use super::{AppState, PostSync};
use crate::db::RecordStore;
use crate::error::{AppError, Result};
use boeklog_engine::Record;
use chrono::Utc;

/// Result of an import.
#[derive(Debug)]
pub struct ImportResponse {
    pub imported: usize,
    pub sync: PostSync,
}

/// Active books as a pretty JSON array.
pub async fn handle_export(state: &AppState) -> Result<String> {
    let books = state.store.get_all(false).await?;
    serde_json::to_string_pretty(&books)
        .map_err(|e| AppError::BadRequest(format!("cannot serialize books: {e}")))
}

/// Import a JSON array of books.
///
/// Books without an id get one; every book is stamped as modified now so the
/// import wins the next sync. Nothing is written when the input is malformed.
pub async fn handle_import(state: &AppState, json: &str) -> Result<ImportResponse> {
    let books: Vec<Record> = serde_json::from_str(json)
        .map_err(|e| AppError::BadRequest(format!("invalid backup file: {e}")))?;

    let imported = state.store.save_many(books, Utc::now()).await?;
    tracing::info!(imported, "Backup imported");

    let sync = state.sync_after_write().await?;
    Ok(ImportResponse { imported, sync })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::SqliteStore;
    use chrono::TimeZone;

    async fn state() -> AppState {
        let config = Config::from_vars(|_| None).unwrap();
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        AppState::new(config, store)
    }

    #[tokio::test]
    async fn export_skips_tombstones() {
        let state = state().await;
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let fields = |title: &str| {
            serde_json::json!({ "title": title, "readDate": "2024-01-01" })
                .as_object()
                .cloned()
                .unwrap()
        };
        state.store.upsert(&Record::new("keep", fields("Keep"), at)).await.unwrap();
        let mut gone = Record::new("gone", fields("Gone"), at);
        gone.mark_deleted(at);
        state.store.upsert(&gone).await.unwrap();

        let json = handle_export(&state).await.unwrap();
        let exported: Vec<Record> = serde_json::from_str(&json).unwrap();

        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].id, "keep");
        assert!(json.contains("\n  {"));
    }

    #[tokio::test]
    async fn import_assigns_ids_and_stamps() {
        let state = state().await;
        let json = r#"[
            {"id": "b1", "title": "Max Havelaar", "updatedAt": "2001-01-01T00:00:00.000Z"},
            {"title": "Karakter", "readDate": "2023-06-01"}
        ]"#;

        let response = handle_import(&state, json).await.unwrap();
        assert_eq!(response.imported, 2);
        assert!(matches!(response.sync, PostSync::Disabled));

        let books = state.store.get_all(false).await.unwrap();
        assert_eq!(books.len(), 2);
        assert!(books.iter().all(|b| !b.id.is_empty()));
        let b1 = state.store.get("b1").await.unwrap().unwrap();
        assert!(b1.modified_at() > Utc.timestamp_opt(978_307_200, 0).unwrap());
    }

    #[tokio::test]
    async fn import_round_trips_export() {
        let source = state().await;
        handle_import(&source, r#"[{"title": "Tirza", "myRating": 9}]"#)
            .await
            .unwrap();
        let json = handle_export(&source).await.unwrap();

        let target = state().await;
        assert_eq!(handle_import(&target, &json).await.unwrap().imported, 1);
        let books = target.store.get_all(false).await.unwrap();
        assert_eq!(books[0].text("title"), Some("Tirza"));
    }

    #[tokio::test]
    async fn malformed_import_writes_nothing() {
        let state = state().await;

        let result = handle_import(&state, r#"{"title": "not an array"}"#).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(state.store.get_all(true).await.unwrap().is_empty());
    }
}
