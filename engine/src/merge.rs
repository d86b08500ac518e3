//! Merge logic for reconciling a local and a remote snapshot.
//!
//! This is the core of determinism. Given the same two snapshots and the same
//! `now`, the merge always produces the same result.
//!
//! # Algorithm
//!
//! 1. Seed the result with every remote record
//! 2. Fold in every local record; on a shared id the copy with the greater
//!    `updatedAt` wins, and local wins ties (a missing `updatedAt` counts as
//!    the epoch)
//! 3. Drop tombstones deleted longer ago than the retention window
//!
//! Records are compared whole. Edits to different fields of the same record
//! on two replicas do not combine: the older edit is discarded. A delete and
//! an edit of the same record are decided the same way, so a later edit
//! brings a deleted record back and a later delete wins over an edit.

use crate::{RecordId, Snapshot, Timestamp};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// How long tombstones are kept, in days.
pub const TOMBSTONE_RETENTION_DAYS: i64 = 30;

/// How a shared id was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resolution {
    /// Local copy was at least as recent
    LocalWins,
    /// Remote copy was strictly more recent
    RemoteWins,
}

/// A record present on both sides with differing content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    /// The contested record
    pub record_id: RecordId,
    /// How it was resolved
    pub resolution: Resolution,
}

/// What a merge did, for logging and summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Ids only the local snapshot had
    pub local_only: Vec<RecordId>,
    /// Ids only the remote snapshot had
    pub remote_only: Vec<RecordId>,
    /// Ids both had with different content
    pub conflicts: Vec<Conflict>,
    /// Expired tombstones dropped from the result
    pub purged: Vec<RecordId>,
}

impl MergeReport {
    /// Number of conflicts the remote side won.
    pub fn remote_wins(&self) -> usize {
        self.conflicts
            .iter()
            .filter(|c| c.resolution == Resolution::RemoteWins)
            .count()
    }

    /// Number of conflicts the local side won.
    pub fn local_wins(&self) -> usize {
        self.conflicts.len() - self.remote_wins()
    }
}

/// The merger folds two snapshots into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merger {
    retention: TimeDelta,
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

impl Merger {
    /// Create a merger with the default 30-day tombstone retention.
    pub fn new() -> Self {
        Self::with_retention(TimeDelta::days(TOMBSTONE_RETENTION_DAYS))
    }

    /// Create a merger with a custom tombstone retention.
    pub fn with_retention(retention: TimeDelta) -> Self {
        Self { retention }
    }

    /// The tombstone retention window.
    pub fn retention(&self) -> TimeDelta {
        self.retention
    }

    /// Merge `local` into `remote` as of `now`.
    ///
    /// Returns the merged snapshot and a report of what happened.
    pub fn merge(
        &self,
        local: &Snapshot,
        remote: &Snapshot,
        now: Timestamp,
    ) -> (Snapshot, MergeReport) {
        let mut report = MergeReport::default();
        let mut merged = remote.clone();

        for record in local.iter() {
            match merged.get(&record.id) {
                None => {
                    report.local_only.push(record.id.clone());
                    merged.insert(record.clone());
                }
                Some(existing) => {
                    let local_wins = record.modified_at() >= existing.modified_at();
                    if existing != record {
                        report.conflicts.push(Conflict {
                            record_id: record.id.clone(),
                            resolution: if local_wins {
                                Resolution::LocalWins
                            } else {
                                Resolution::RemoteWins
                            },
                        });
                    }
                    if local_wins {
                        merged.insert(record.clone());
                    }
                }
            }
        }

        report.remote_only = remote
            .ids()
            .filter(|id| !local.contains(id))
            .cloned()
            .collect();

        let mut purged = Vec::new();
        merged.retain(|record| {
            if record.is_expired_tombstone(now, self.retention) {
                purged.push(record.id.clone());
                false
            } else {
                true
            }
        });
        report.purged = purged;

        (merged, report)
    }
}

/// Merge two snapshots with the default retention window.
pub fn merge(local: &Snapshot, remote: &Snapshot, now: Timestamp) -> Snapshot {
    Merger::new().merge(local, remote, now).0
}
