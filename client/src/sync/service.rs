//! The sync entry point used by the application.

use super::orchestrator::SyncOrchestrator;
use super::status::{SettleDelays, SyncStatus};
use crate::config::{Config, SyncSettings};
use crate::db::RecordStore;
use crate::error::SyncError;
use crate::remote::{GitHubConfig, GitHubStore, VersionToken};
use boeklog_engine::{MergeReport, SnapshotSummary};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Summary of a completed sync.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    /// Counts of the snapshot now held locally and remotely
    pub summary: SnapshotSummary,
    /// Version of the remote file after the push
    pub version: VersionToken,
    /// What the merge did
    pub merge: MergeReport,
    /// Pull-merge-push rounds it took
    pub attempts: u32,
}

/// Clears the in-flight flag when a sync ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs syncs one at a time and publishes their status.
///
/// The local store is replaced with the merged snapshot only after the push
/// succeeded; a failed sync leaves it untouched.
pub struct SyncService {
    orchestrator: SyncOrchestrator,
    store: Arc<dyn RecordStore>,
    in_flight: AtomicBool,
    status: Arc<watch::Sender<SyncStatus>>,
    generation: Arc<AtomicU64>,
    delays: SettleDelays,
}

impl SyncService {
    pub fn new(orchestrator: SyncOrchestrator, store: Arc<dyn RecordStore>) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            orchestrator,
            store,
            in_flight: AtomicBool::new(false),
            status: Arc::new(status),
            generation: Arc::new(AtomicU64::new(0)),
            delays: SettleDelays::default(),
        }
    }

    /// Sync against the GitHub file named in `settings`.
    ///
    /// Fails with `NotConfigured` when no token is set.
    pub fn github(
        config: &Config,
        settings: &SyncSettings,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self, SyncError> {
        let remote = GitHubStore::new(GitHubConfig::from_settings(config, settings)?)?;
        Ok(Self::new(SyncOrchestrator::new(Arc::new(remote)), store))
    }

    pub fn with_settle_delays(mut self, delays: SettleDelays) -> Self {
        self.delays = delays;
        self
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one sync.
    ///
    /// Returns `Ok(None)` without doing anything when a sync is already in
    /// flight.
    pub async fn trigger(&self) -> Result<Option<SyncReport>, SyncError> {
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!("Sync already in progress, skipping");
            return Ok(None);
        };

        self.set_status(SyncStatus::Syncing);
        match self.run().await {
            Ok(report) => {
                tracing::info!(
                    records = report.summary.active_count,
                    tombstones = report.summary.tombstone_count,
                    attempts = report.attempts,
                    version = %report.version,
                    "Sync completed"
                );
                self.set_status(SyncStatus::Synced);
                Ok(Some(report))
            }
            Err(err) => {
                tracing::error!(error = %err, "Sync failed");
                self.set_status(SyncStatus::Error);
                Err(err)
            }
        }
    }

    async fn run(&self) -> Result<SyncReport, SyncError> {
        let local = self.store.snapshot().await?;
        let outcome = self.orchestrator.synchronize(&local).await?;
        self.store.replace_all(&outcome.snapshot).await?;

        Ok(SyncReport {
            summary: SnapshotSummary::from(&outcome.snapshot),
            version: outcome.version,
            merge: outcome.report,
            attempts: outcome.attempts,
        })
    }

    /// Publish `status`, scheduling the fall back to idle for transient ones.
    ///
    /// A later status change cancels a pending fall back.
    fn set_status(&self, status: SyncStatus) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.status.send_replace(status);

        let Some(delay) = self.delays.for_status(status) else {
            return;
        };
        let sender = Arc::clone(&self.status);
        let current = Arc::clone(&self.generation);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sender.send_if_modified(|status| {
                if current.load(Ordering::Acquire) == generation {
                    *status = SyncStatus::Idle;
                    true
                } else {
                    false
                }
            });
        });
    }
}
