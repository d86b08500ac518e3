//! Content encoding for the remote store.
//!
//! The remote file holds the snapshot as pretty-printed UTF-8 JSON; the
//! contents API transports it base64-encoded. Decoding tolerates the line
//! breaks some APIs insert into long base64 payloads.

use crate::{error::Result, Error, Snapshot};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Encode a snapshot as base64 of its pretty JSON.
pub fn encode_content(snapshot: &Snapshot) -> Result<String> {
    let json = snapshot.to_json_pretty()?;
    Ok(STANDARD.encode(json.as_bytes()))
}

/// Decode base64 content into a snapshot.
pub fn decode_content(content: &str) -> Result<Snapshot> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::InvalidEncoding(e.to_string()))?;
    let json = String::from_utf8(bytes).map_err(|e| Error::InvalidEncoding(e.to_string()))?;
    Snapshot::from_json(&json)
}
