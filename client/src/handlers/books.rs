//! Book handlers: add, list, show, edit, delete.

use super::{AppState, PostSync};
use crate::db::RecordStore;
use crate::error::{AppError, Result, StoreError};
use boeklog_engine::Record;
use chrono::{NaiveDate, Utc};
use serde_json::{Map, Value};

/// Title used when a book is added without one.
pub const UNKNOWN_TITLE: &str = "Onbekende titel";

/// Ratings run from 1 to 10.
pub const MAX_RATING: u8 = 10;

/// Fields a user can set on a book.
#[derive(Debug, Default, Clone)]
pub struct BookFields {
    pub title: Option<String>,
    pub author: Option<String>,
    pub read_date: Option<NaiveDate>,
    pub rating: Option<u8>,
    pub review: Option<String>,
    pub publish_year: Option<i32>,
    pub pages: Option<u32>,
}

impl BookFields {
    fn validate(&self) -> Result<()> {
        if let Some(rating) = self.rating {
            if rating == 0 || rating > MAX_RATING {
                return Err(AppError::BadRequest(format!(
                    "rating must be between 1 and {MAX_RATING}, got {rating}"
                )));
            }
        }
        Ok(())
    }

    /// The domain payload for the fields that are set.
    ///
    /// An empty author or review clears the stored value.
    fn into_payload(self) -> Map<String, Value> {
        let mut payload = Map::new();
        if let Some(title) = self.title.map(|t| t.trim().to_string()) {
            if !title.is_empty() {
                payload.insert("title".into(), title.into());
            }
        }
        if let Some(author) = self.author {
            payload.insert("author".into(), optional_text(author));
        }
        if let Some(date) = self.read_date {
            payload.insert("readDate".into(), date.format("%Y-%m-%d").to_string().into());
        }
        if let Some(rating) = self.rating {
            payload.insert("myRating".into(), rating.into());
        }
        if let Some(review) = self.review {
            payload.insert("myReview".into(), optional_text(review));
        }
        if let Some(year) = self.publish_year {
            payload.insert("publishYear".into(), year.into());
        }
        if let Some(pages) = self.pages {
            payload.insert("numberOfPages".into(), pages.into());
        }
        payload
    }
}

fn optional_text(text: String) -> Value {
    let text = text.trim();
    if text.is_empty() {
        Value::Null
    } else {
        Value::String(text.to_string())
    }
}

/// A book after a write, plus the sync that followed.
#[derive(Debug)]
pub struct BookResponse {
    pub book: Record,
    pub sync: PostSync,
}

/// Result of a delete.
#[derive(Debug)]
pub struct DeleteResponse {
    pub id: String,
    /// Tombstoned rather than removed
    pub soft: bool,
    pub sync: PostSync,
}

/// Add a book. A missing title or read date gets a default.
pub async fn handle_add(state: &AppState, fields: BookFields) -> Result<BookResponse> {
    fields.validate()?;
    let now = Utc::now();

    let mut payload = Map::new();
    payload.insert("title".into(), UNKNOWN_TITLE.into());
    payload.insert(
        "readDate".into(),
        now.date_naive().format("%Y-%m-%d").to_string().into(),
    );
    payload.extend(fields.into_payload());

    let book = state.store.save(Record::new("", payload, now), now).await?;
    tracing::info!(id = %book.id, "Book added");

    let sync = state.sync_after_write().await?;
    Ok(BookResponse { book, sync })
}

/// Active books, most recently read first; tombstones too when asked.
pub async fn handle_list(state: &AppState, include_deleted: bool) -> Result<Vec<Record>> {
    Ok(state.store.get_all(include_deleted).await?)
}

/// A single active book.
pub async fn handle_show(state: &AppState, id: &str) -> Result<Record> {
    active_book(state, id).await
}

/// Overwrite the given fields of a book.
pub async fn handle_edit(state: &AppState, id: &str, fields: BookFields) -> Result<BookResponse> {
    fields.validate()?;
    let mut book = active_book(state, id).await?;

    let now = Utc::now();
    book.update_fields(fields.into_payload(), now);
    let book = state.store.save(book, now).await?;
    tracing::info!(id = %book.id, "Book updated");

    let sync = state.sync_after_write().await?;
    Ok(BookResponse { book, sync })
}

/// Delete a book.
///
/// With sync enabled the book becomes a tombstone so the deletion reaches
/// other devices; without sync it is removed outright.
pub async fn handle_delete(state: &AppState, id: &str) -> Result<DeleteResponse> {
    active_book(state, id).await?;

    let soft = state.sync_enabled().await?;
    if soft {
        state.store.soft_delete(id, Utc::now()).await?;
    } else {
        state.store.delete(id).await?;
    }
    tracing::info!(id, soft, "Book deleted");

    let sync = state.sync_after_write().await?;
    Ok(DeleteResponse {
        id: id.to_string(),
        soft,
        sync,
    })
}

async fn active_book(state: &AppState, id: &str) -> Result<Record> {
    match state.store.get(id).await? {
        Some(book) if book.is_active() => Ok(book),
        _ => Err(StoreError::NotFound(id.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::SqliteStore;

    async fn state() -> AppState {
        let config = Config::from_vars(|_| None).unwrap();
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        AppState::new(config, store)
    }

    fn fields(title: &str) -> BookFields {
        BookFields {
            title: Some(title.into()),
            author: Some("Harry Mulisch".into()),
            read_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn add_without_sync() {
        let state = state().await;
        let response = handle_add(&state, fields("De aanslag")).await.unwrap();

        assert!(matches!(response.sync, PostSync::Disabled));
        assert_eq!(response.book.text("title"), Some("De aanslag"));
        assert_eq!(response.book.text("readDate"), Some("2024-03-01"));
        assert!(response.book.updated_at.is_some());
        assert_eq!(handle_show(&state, &response.book.id).await.unwrap(), response.book);
    }

    #[tokio::test]
    async fn add_applies_defaults() {
        let state = state().await;
        let book = handle_add(&state, BookFields::default()).await.unwrap().book;

        assert_eq!(book.text("title"), Some(UNKNOWN_TITLE));
        assert!(book.text("readDate").is_some());
    }

    #[tokio::test]
    async fn rating_out_of_range_is_rejected() {
        let state = state().await;
        let request = BookFields {
            rating: Some(11),
            ..fields("X")
        };

        let result = handle_add(&state, request).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(handle_list(&state, true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_keeps_other_fields() {
        let state = state().await;
        let added = handle_add(&state, fields("Het stenen bruidsbed")).await.unwrap().book;

        let edit = BookFields {
            rating: Some(8),
            review: Some("  Prachtig  ".into()),
            ..Default::default()
        };
        let edited = handle_edit(&state, &added.id, edit).await.unwrap().book;

        assert_eq!(edited.text("title"), Some("Het stenen bruidsbed"));
        assert_eq!(edited.text("author"), Some("Harry Mulisch"));
        assert_eq!(edited.field("myRating"), Some(&Value::from(8)));
        assert_eq!(edited.text("myReview"), Some("Prachtig"));
        assert!(edited.modified_at() >= added.modified_at());
    }

    #[tokio::test]
    async fn delete_without_sync_is_hard() {
        let state = state().await;
        let added = handle_add(&state, fields("X")).await.unwrap().book;

        let response = handle_delete(&state, &added.id).await.unwrap();

        assert!(!response.soft);
        assert!(state.store.get(&added.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleted_book_is_not_found() {
        let state = state().await;
        let added = handle_add(&state, fields("X")).await.unwrap().book;
        state.store.soft_delete(&added.id, Utc::now()).await.unwrap();

        let result = handle_show(&state, &added.id).await;
        assert!(matches!(result, Err(AppError::Store(StoreError::NotFound(_)))));

        let result = handle_edit(&state, &added.id, fields("Y")).await;
        assert!(matches!(result, Err(AppError::Store(StoreError::NotFound(_)))));
    }
}
