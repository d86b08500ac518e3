//! Record types for catalogued items.

use crate::{RecordId, Timestamp};
use chrono::{SubsecRound, TimeDelta};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys owned by [`Record`] itself; never stored in the domain payload.
pub const RESERVED_FIELDS: [&str; 3] = ["id", "updatedAt", "deletedAt"];

/// A catalogued item (a book) as stored locally and in sync payloads.
///
/// Serializes to a flat JSON object: `id`, `updatedAt` and `deletedAt` sit
/// next to the domain fields, which the merge never inspects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier, the merge key. Empty until a store assigns one.
    #[serde(default)]
    pub id: RecordId,
    /// When the record was last mutated
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_millis"
    )]
    pub updated_at: Option<Timestamp>,
    /// Set when the record is a tombstone
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_millis"
    )]
    pub deleted_at: Option<Timestamp>,
    /// Domain payload (title, author, readDate, myRating, ...)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create a new record stamped with `now`.
    pub fn new(id: impl Into<RecordId>, fields: Map<String, Value>, now: Timestamp) -> Self {
        Self {
            id: id.into(),
            updated_at: Some(to_millis(now)),
            deleted_at: None,
            fields: strip_reserved(fields),
        }
    }

    /// Check if record is active (not deleted).
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Check if record is a tombstone.
    pub fn is_tombstone(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Last modification time, with a missing `updatedAt` read as the epoch.
    pub fn modified_at(&self) -> Timestamp {
        self.updated_at.unwrap_or_default()
    }

    /// Whether this is a tombstone deleted more than `retention` before `now`.
    pub fn is_expired_tombstone(&self, now: Timestamp, retention: TimeDelta) -> bool {
        match self.deleted_at {
            Some(deleted_at) => deleted_at < now - retention,
            None => false,
        }
    }

    /// Refresh the modification time.
    pub fn touch(&mut self, now: Timestamp) {
        self.updated_at = Some(to_millis(now));
    }

    /// Mark record as deleted (tombstone).
    pub fn mark_deleted(&mut self, now: Timestamp) {
        self.deleted_at = Some(to_millis(now));
        self.touch(now);
    }

    /// Overwrite the given domain fields, leaving the others untouched.
    pub fn update_fields(&mut self, changes: Map<String, Value>, now: Timestamp) {
        for (key, value) in strip_reserved(changes) {
            self.fields.insert(key, value);
        }
        self.touch(now);
    }

    /// Get a domain field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Get a domain field as a non-empty string.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Timestamps are kept at the precision they are stored with.
fn to_millis(ts: Timestamp) -> Timestamp {
    ts.trunc_subsecs(3)
}

fn strip_reserved(mut fields: Map<String, Value>) -> Map<String, Value> {
    for key in RESERVED_FIELDS {
        fields.remove(key);
    }
    fields
}

/// ISO-8601 UTC timestamps with millisecond precision (`2024-05-01T10:00:00.000Z`).
///
/// `null` and empty strings read as absent.
mod iso_millis {
    use crate::Timestamp;
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => DateTime::parse_from_rfc3339(s)
                .map(|ts| Some(ts.with_timezone(&Utc).trunc_subsecs(3)))
                .map_err(serde::de::Error::custom),
        }
    }
}
