//! Canonical entry encoding, version 1.
//!
//! This byte layout is a cross-implementation wire contract: every entry
//! hash ever written depends on it. It is frozen. A change requires a new
//! `schema_version`, recorded on each entry, with v1 kept for old entries.
//!
//! Layout (in order):
//!   1. ASCII domain tag `tradechain.entry` (16 bytes)
//!   2. schema_version, u16 big-endian
//!   3. subject_type, length-prefixed
//!   4. subject_id, length-prefixed
//!   5. sequence, u64 big-endian
//!   6. action tag, length-prefixed
//!   7. actor: 0x00 if absent, else 0x01 + actor id length-prefixed
//!   8. canonical metadata JSON, length-prefixed
//!   9. created_at, i64 big-endian Unix nanoseconds
//!  10. previous_hash, 32 raw bytes
//!
//! "Length-prefixed" means a u32 big-endian byte count followed by UTF-8.

use chrono::{DateTime, Utc};
use serde_json::Value;

use tradechain_contracts::{
    action::Action,
    error::{LedgerError, LedgerResult},
    hash::Sha256Hash,
    request::Metadata,
    subject::{ActorId, SubjectType},
};

/// Domain separation tag prefixed to every v1 encoding.
pub const DOMAIN_TAG: &[u8; 16] = b"tradechain.entry";

/// The only encoding version this build knows how to produce and check.
pub const SCHEMA_VERSION_V1: u16 = 1;

/// Borrowed view of every hashed field of an entry.
#[derive(Debug, Clone, Copy)]
pub struct EntryFields<'a> {
    pub schema_version: u16,
    pub subject_type: SubjectType,
    pub subject_id: &'a str,
    pub sequence: u64,
    pub action: Action,
    pub actor_id: Option<&'a ActorId>,
    pub metadata: &'a Metadata,
    pub created_at: DateTime<Utc>,
    pub previous_hash: &'a Sha256Hash,
}

/// Encode `fields` into the canonical byte string for its schema version.
pub fn encode(fields: &EntryFields<'_>) -> LedgerResult<Vec<u8>> {
    match fields.schema_version {
        SCHEMA_VERSION_V1 => encode_v1(fields),
        version => Err(LedgerError::UnsupportedSchemaVersion { version }),
    }
}

fn encode_v1(fields: &EntryFields<'_>) -> LedgerResult<Vec<u8>> {
    let metadata = canonical_metadata(fields.metadata);
    let created_at = fields
        .created_at
        .timestamp_nanos_opt()
        .ok_or_else(|| LedgerError::Encoding {
            reason: format!(
                "created_at {} is outside the nanosecond timestamp range",
                fields.created_at
            ),
        })?;

    let mut out = Vec::with_capacity(128 + metadata.len() + fields.subject_id.len());
    out.extend_from_slice(DOMAIN_TAG);
    out.extend_from_slice(&fields.schema_version.to_be_bytes());
    put_str(&mut out, fields.subject_type.as_str())?;
    put_str(&mut out, fields.subject_id)?;
    out.extend_from_slice(&fields.sequence.to_be_bytes());
    put_str(&mut out, fields.action.as_str())?;
    match fields.actor_id {
        None => out.push(0x00),
        Some(actor) => {
            out.push(0x01);
            put_str(&mut out, &actor.0)?;
        }
    }
    put_str(&mut out, &metadata)?;
    out.extend_from_slice(&created_at.to_be_bytes());
    out.extend_from_slice(fields.previous_hash.as_bytes());
    Ok(out)
}

fn put_str(out: &mut Vec<u8>, s: &str) -> LedgerResult<()> {
    let len = u32::try_from(s.len()).map_err(|_| LedgerError::Encoding {
        reason: format!("field of {} bytes exceeds the u32 length prefix", s.len()),
    })?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

/// Canonical JSON for a metadata map.
///
/// Object keys are sorted at every level regardless of how the map type
/// orders them, and no whitespace is emitted. Strings and numbers use
/// serde_json's formatting. An empty map is `{}`.
pub fn canonical_metadata(metadata: &Metadata) -> String {
    let mut out = String::new();
    out.push('{');
    // BTreeMap iterates in sorted key order.
    for (i, (key, value)) in metadata.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_json_string(&mut out, key);
        out.push(':');
        write_canonical(&mut out, value);
    }
    out.push('}');
    out
}

fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_string(out, key);
                out.push(':');
                write_canonical(out, &map[key.as_str()]);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        Value::String(s) => write_json_string(out, s),
        // Null, Bool, and Number display as compact JSON.
        other => out.push_str(&other.to_string()),
    }
}

fn write_json_string(out: &mut String, s: &str) {
    // Serializing a &str to JSON cannot fail.
    out.push_str(&Value::String(s.to_string()).to_string());
}

// ── Tests ─────────────────────────────────────────────────────────────────────
