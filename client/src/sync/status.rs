//! User-visible sync status.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// State shown by a sync indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Synced,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long transient statuses stay visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleDelays {
    pub synced: Duration,
    pub error: Duration,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            synced: Duration::from_secs(3),
            error: Duration::from_secs(5),
        }
    }
}

impl SettleDelays {
    /// Delay before `status` falls back to idle, if it does.
    pub fn for_status(&self, status: SyncStatus) -> Option<Duration> {
        match status {
            SyncStatus::Synced => Some(self.synced),
            SyncStatus::Error => Some(self.error),
            SyncStatus::Idle | SyncStatus::Syncing => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names() {
        assert_eq!(SyncStatus::default(), SyncStatus::Idle);
        assert_eq!(SyncStatus::Syncing.to_string(), "syncing");
        assert_eq!(serde_json::to_string(&SyncStatus::Synced).unwrap(), "\"synced\"");
    }

    #[test]
    fn settle_delays() {
        let delays = SettleDelays::default();
        assert_eq!(delays.for_status(SyncStatus::Synced), Some(Duration::from_secs(3)));
        assert_eq!(delays.for_status(SyncStatus::Error), Some(Duration::from_secs(5)));
        assert_eq!(delays.for_status(SyncStatus::Syncing), None);
        assert_eq!(delays.for_status(SyncStatus::Idle), None);
    }
}
