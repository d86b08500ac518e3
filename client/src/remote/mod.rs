//! Remote content store: a versioned blob addressed by repository and path.
//!
//! Writes use optimistic concurrency. A read hands out a [`VersionToken`];
//! a write presenting a stale token fails with
//! [`SyncError::VersionConflict`](crate::error::SyncError::VersionConflict).

mod github;

pub use github::*;

use crate::error::SyncError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque optimistic-concurrency marker from the remote store.
///
/// Never interpreted; only handed back on the next write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The remote file as read: encoded content plus its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteContent {
    /// Base64 of the snapshot JSON
    pub content: String,
    /// Version to present on the next write
    pub version: VersionToken,
}

/// A versioned blob store holding the sync file.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read the file. `None` when it does not exist yet.
    async fn fetch(&self) -> Result<Option<RemoteContent>, SyncError>;

    /// Write the file.
    ///
    /// `expected` is the version from the last read, or `None` to create the
    /// file. Fails with `VersionConflict` when the file changed in between.
    async fn store(
        &self,
        content: &str,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, SyncError>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}
