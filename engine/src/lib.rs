//! # BoekLog Engine
//!
//! A deterministic merge engine for the BoekLog book catalogue.
//!
//! This crate holds the pure logic behind multi-device sync: the record model,
//! replica snapshots, the remote content encoding and the last-writer-wins
//! merge with tombstone garbage collection. The same inputs always produce
//! the same outputs.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine knows nothing about files, network or databases
//! - **Deterministic**: the current time is an explicit argument
//! - **Opaque payloads**: domain fields are carried, never inspected
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`Record`] has an id, an `updatedAt` timestamp, an optional `deletedAt`
//! tombstone marker and a JSON object of domain fields.
//!
//! ### Snapshots
//!
//! A [`Snapshot`] is the full state of one replica, keyed by record id.
//!
//! ### Merge
//!
//! [`merge`] folds a local and a remote snapshot into one:
//! - union of both sides
//! - on a shared id the later `updatedAt` wins, local wins ties
//! - tombstones older than [`TOMBSTONE_RETENTION_DAYS`] are dropped
//!
//! ## Quick Start
//!
//! ```rust
//! use boeklog_engine::{merge, Record, Snapshot};
//! use chrono::{TimeZone, Utc};
//! use serde_json::json;
//!
//! let t1 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
//! let t2 = Utc.timestamp_opt(1_700_000_100, 0).unwrap();
//! let fields = |title: &str| json!({ "title": title }).as_object().unwrap().clone();
//!
//! let local = Snapshot::from_records(vec![Record::new("b1", fields("local edit"), t1)]);
//! let remote = Snapshot::from_records(vec![
//!     Record::new("b1", fields("remote edit"), t2),
//!     Record::new("b2", fields("other book"), t1),
//! ]);
//!
//! let merged = merge(&local, &remote, t2);
//! assert_eq!(merged.len(), 2);
//! assert_eq!(merged.get("b1").unwrap().text("title"), Some("remote edit"));
//! ```
//!
//! ## Wire format
//!
//! [`encode_content`] and [`decode_content`] convert a snapshot to and from the
//! base64-wrapped pretty JSON stored in the remote file.

pub mod codec;
pub mod error;
pub mod merge;
pub mod record;
pub mod snapshot;

// Re-export main types at crate root
pub use codec::{decode_content, encode_content};
pub use error::Error;
pub use merge::{merge, Conflict, MergeReport, Merger, Resolution, TOMBSTONE_RETENTION_DAYS};
pub use record::Record;
pub use snapshot::{Snapshot, SnapshotSummary};

/// Type aliases for clarity
pub type RecordId = String;
pub type Timestamp = chrono::DateTime<chrono::Utc>;
