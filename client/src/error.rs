//! Unified error handling for the client.

use crate::config::ConfigError;
use boeklog_engine::RecordId;

/// Errors of one sync cycle.
///
/// None of these leave the local store modified: it is only written after a
/// successful push.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Sync is not configured: no GitHub token set")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Remote file was changed by another device (version conflict)")]
    VersionConflict,

    #[error("Malformed remote data: {0}")]
    MalformedRemoteData(String),

    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to encode snapshot: {0}")]
    Encoding(#[from] boeklog_engine::Error),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::MalformedRemoteData(err.to_string())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}

/// Local store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Book not found: {0}")]
    NotFound(RecordId),
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Engine error: {0}")]
    Engine(#[from] boeklog_engine::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

/// Result type alias for command handlers.
pub type Result<T> = std::result::Result<T, AppError>;
