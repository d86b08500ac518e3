//! Sync and status handlers.

use super::AppState;
use crate::db::{keys, RecordStore};
use crate::error::Result;
use crate::sync::SyncReport;
use boeklog_engine::SnapshotSummary;

/// Local sync state as shown by `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    pub enabled: bool,
    pub repo: String,
    pub path: String,
    /// Remote version after the last successful sync
    pub version: Option<String>,
    pub last_synced_at: Option<String>,
    pub local: SnapshotSummary,
}

/// Run a sync now. `None` when another sync was already running.
///
/// Fails with `NotConfigured` when no token is set.
pub async fn handle_sync(state: &AppState) -> Result<Option<SyncReport>> {
    state.run_sync().await
}

pub async fn handle_status(state: &AppState) -> Result<StatusResponse> {
    let settings = state.store.load_sync_settings().await?;
    let local = SnapshotSummary::from(&state.store.snapshot().await?);

    Ok(StatusResponse {
        enabled: settings.is_enabled(),
        repo: settings.repo,
        path: settings.path,
        version: state.store.get_setting(keys::GITHUB_SHA).await?,
        last_synced_at: state.store.get_setting(keys::LAST_SYNCED_AT).await?,
        local,
    })
}
