//! Key/value settings persisted next to the books.

use super::records::SqliteStore;
use crate::config::{non_empty, SyncSettings};
use crate::error::StoreResult;

/// Setting keys.
pub mod keys {
    pub const GITHUB_TOKEN: &str = "github_token";
    pub const GITHUB_REPO: &str = "github_repo";
    pub const GITHUB_PATH: &str = "github_path";
    /// Version token of the remote file after the last successful sync
    pub const GITHUB_SHA: &str = "github_sha";
    pub const LAST_SYNCED_AT: &str = "last_synced_at";
}

impl SqliteStore {
    /// Get a setting.
    pub async fn get_setting(&self, key: &str) -> StoreResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(self.pool())
            .await?;
        Ok(value)
    }

    /// Set a setting, replacing any previous value.
    pub async fn set_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Remove a setting.
    pub async fn remove_setting(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM settings WHERE key = $1")
            .bind(key)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Load the sync settings, with defaults for repository and path.
    pub async fn load_sync_settings(&self) -> StoreResult<SyncSettings> {
        Ok(SyncSettings::from_stored(
            self.get_setting(keys::GITHUB_TOKEN).await?,
            self.get_setting(keys::GITHUB_REPO).await?,
            self.get_setting(keys::GITHUB_PATH).await?,
        ))
    }

    /// Save the sync settings as entered by the user.
    ///
    /// An empty token removes the stored one; an empty repository or path
    /// leaves the stored value in place.
    pub async fn save_sync_settings(
        &self,
        token: Option<String>,
        repo: Option<String>,
        path: Option<String>,
    ) -> StoreResult<SyncSettings> {
        if let Some(token) = token {
            match non_empty(Some(token)) {
                Some(token) => self.set_setting(keys::GITHUB_TOKEN, &token).await?,
                None => self.remove_setting(keys::GITHUB_TOKEN).await?,
            }
        }
        if let Some(repo) = non_empty(repo) {
            self.set_setting(keys::GITHUB_REPO, &repo).await?;
        }
        if let Some(path) = non_empty(path) {
            self.set_setting(keys::GITHUB_PATH, &path).await?;
        }
        self.load_sync_settings().await
    }
}
