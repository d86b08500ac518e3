//! Command handlers.
//!
//! Each handler takes the shared [`AppState`] and a request, and returns a
//! response value; printing is left to the binary.

mod backup;
mod books;
mod settings;
mod sync;

pub use backup::*;
pub use books::*;
pub use settings::*;
pub use sync::*;

use crate::config::Config;
use crate::db::{keys, RecordStore, SqliteStore};
use crate::error::{AppError, Result, SyncError};
use crate::sync::{SyncReport, SyncService};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<SqliteStore>,
    /// Built on first use; every clone shares the same single-flight guard.
    sync: Arc<Mutex<Option<Arc<SyncService>>>>,
}

/// What happened to the sync that follows a local write.
#[derive(Debug)]
pub enum PostSync {
    /// No token configured
    Disabled,
    Synced(SyncReport),
    /// Another sync was already running
    Skipped,
    /// The local write stands; the change goes out with the next sync
    Failed(SyncError),
}

impl AppState {
    pub fn new(config: Config, store: SqliteStore) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            sync: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether a sync token is configured.
    pub async fn sync_enabled(&self) -> Result<bool> {
        Ok(self.store.load_sync_settings().await?.is_enabled())
    }

    /// The sync service for the stored settings, built on first use.
    pub async fn sync_service(&self) -> Result<Arc<SyncService>> {
        let mut cached = self.sync.lock().await;
        if let Some(service) = cached.as_ref() {
            return Ok(service.clone());
        }

        let settings = self.store.load_sync_settings().await?;
        let store: Arc<dyn RecordStore> = self.store.clone();
        let service = Arc::new(SyncService::github(&self.config, &settings, store)?);
        *cached = Some(service.clone());
        Ok(service)
    }

    /// Forget the cached sync service; the next sync reads the settings again.
    pub async fn reset_sync(&self) {
        self.sync.lock().await.take();
    }

    /// Run one sync and remember the resulting version.
    pub async fn run_sync(&self) -> Result<Option<SyncReport>> {
        let service = self.sync_service().await?;
        let report = service.trigger().await?;
        if let Some(report) = &report {
            self.store
                .set_setting(keys::GITHUB_SHA, report.version.as_str())
                .await?;
            self.store
                .set_setting(
                    keys::LAST_SYNCED_AT,
                    &Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                )
                .await?;
        }
        Ok(report)
    }

    /// Sync after a local write, if sync is enabled.
    ///
    /// A failure is logged and returned, never raised.
    pub async fn sync_after_write(&self) -> Result<PostSync> {
        if !self.sync_enabled().await? {
            return Ok(PostSync::Disabled);
        }
        match self.run_sync().await {
            Ok(Some(report)) => Ok(PostSync::Synced(report)),
            Ok(None) => Ok(PostSync::Skipped),
            Err(AppError::Sync(err)) => {
                tracing::warn!(error = %err, "Sync after local change failed");
                Ok(PostSync::Failed(err))
            }
            Err(err) => Err(err),
        }
    }
}
