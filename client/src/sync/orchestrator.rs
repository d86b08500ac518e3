//! One synchronization cycle against the remote store.
//!
//! # Protocol
//!
//! 1. Pull the remote file and its version (missing file = empty snapshot)
//! 2. Merge the local snapshot with it
//! 3. Push the result, presenting the version from step 1
//! 4. On a version conflict, run 1-3 once more against the same local
//!    snapshot; a second conflict is returned to the caller
//!
//! The orchestrator never touches the local store. Writing the merged
//! snapshot back is the caller's job, and only after a successful push.

use crate::error::SyncError;
use crate::remote::{RemoteStore, VersionToken};
use boeklog_engine::{
    decode_content, encode_content, MergeReport, Merger, Snapshot, SnapshotSummary, Timestamp,
};
use std::sync::Arc;

/// Attempts per cycle: the first push plus one retry after a conflict.
pub const MAX_ATTEMPTS: u32 = 2;

/// Result of a successful cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    /// The merged snapshot now stored remotely
    pub snapshot: Snapshot,
    /// Version of the remote file after the push
    pub version: VersionToken,
    /// What the final merge did
    pub report: MergeReport,
    /// Number of pull-merge-push rounds it took
    pub attempts: u32,
}

/// Drives pull, merge and push against one remote store.
pub struct SyncOrchestrator {
    remote: Arc<dyn RemoteStore>,
    merger: Merger,
    clock: fn() -> Timestamp,
}

impl SyncOrchestrator {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            remote,
            merger: Merger::new(),
            clock: chrono::Utc::now,
        }
    }

    /// Use a different source for the current time.
    pub fn with_clock(mut self, clock: fn() -> Timestamp) -> Self {
        self.clock = clock;
        self
    }

    /// Synchronize `local` with the remote store.
    pub async fn synchronize(&self, local: &Snapshot) -> Result<SyncOutcome, SyncError> {
        let mut attempt = 1;
        loop {
            match self.attempt(local).await {
                Ok((snapshot, version, report)) => {
                    return Ok(SyncOutcome {
                        snapshot,
                        version,
                        report,
                        attempts: attempt,
                    })
                }
                Err(SyncError::VersionConflict) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        location = %self.remote.location(),
                        attempt,
                        "Remote changed during sync, retrying with fresh state"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn pull(&self) -> Result<(Snapshot, Option<VersionToken>), SyncError> {
        match self.remote.fetch().await? {
            None => Ok((Snapshot::new(), None)),
            Some(remote) => {
                let snapshot = decode_content(&remote.content)
                    .map_err(|e| SyncError::MalformedRemoteData(e.to_string()))?;
                Ok((snapshot, Some(remote.version)))
            }
        }
    }

    async fn attempt(
        &self,
        local: &Snapshot,
    ) -> Result<(Snapshot, VersionToken, MergeReport), SyncError> {
        let (remote, version) = self.pull().await?;
        tracing::debug!(
            location = %self.remote.location(),
            remote_records = remote.len(),
            exists = version.is_some(),
            "Pulled remote snapshot"
        );

        let (merged, report) = self.merger.merge(local, &remote, (self.clock)());
        let summary = SnapshotSummary::from(&merged);
        tracing::debug!(
            records = summary.record_count,
            tombstones = summary.tombstone_count,
            local_only = report.local_only.len(),
            remote_only = report.remote_only.len(),
            conflicts = report.conflicts.len(),
            purged = report.purged.len(),
            "Merged snapshots"
        );

        let content = encode_content(&merged)?;
        let new_version = self.remote.store(&content, version.as_ref()).await?;
        tracing::debug!(version = %new_version, "Pushed merged snapshot");

        Ok((merged, new_version, report))
    }
}
