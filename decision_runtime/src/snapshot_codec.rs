//! Snapshot Codec: flat key-value text encoder/decoder.
//!
//! One `key=value` per line. Blank lines and lines starting with `#` are
//! ignored. The last key is `checksum`, the SHA-256 (lowercase hex) of every
//! preceding `key=value` line, each terminated by `\n`.
//!
//! - `encode_snapshot`:  SaveSnapshot → text
//! - `decode_snapshot`:  text → SaveSnapshot (strict: unknown, missing and
//!                       duplicate keys are rejected, checksum verified)
//! - `restore_snapshot`: decode + invariant validation → GameState
//! - `snapshot_checksum`: checksum of an encoded body

use std::collections::BTreeMap;
use std::io;

use sha2::{Digest, Sha256};
use thiserror::Error;

use decision_engine::arithmetic::is_valid_card_id;
use decision_engine::invariants::try_validate_invariants;
use decision_engine::resources::{ResourceMap, ResourceType};
use decision_engine::state::{DecisionRecord, GameState};

use crate::snapshot::SaveSnapshot;

pub const FORMAT_VERSION: &str = "edsave/1";

const HEADER: &str = "# Executive decision save";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A line that is not `key=value`, or a value that does not parse.
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("missing key {0:?}")]
    MissingKey(String),

    #[error("unknown key {0:?}")]
    UnknownKey(String),

    #[error("duplicate key {0:?}")]
    DuplicateKey(String),

    #[error("unsupported save format {0:?}")]
    UnsupportedFormat(String),

    #[error("checksum mismatch: file says {expected}, content hashes to {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Decoded state violates kernel invariants.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// State cannot be represented in the flat format.
    #[error("cannot encode snapshot: {0}")]
    Unencodable(String),

    #[error("invalid save name {0:?}: must match [A-Za-z0-9_-]+")]
    InvalidName(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Encode a snapshot. Output is byte-identical for identical snapshots.
pub fn encode_snapshot(snap: &SaveSnapshot) -> Result<String, SnapshotError> {
    let mut lines: Vec<(String, String)> = Vec::new();
    lines.push(("format".into(), FORMAT_VERSION.into()));
    lines.push(("current_day".into(), snap.current_day.to_string()));
    lines.push(("total_decisions".into(), snap.total_decisions.to_string()));
    lines.push(("chaos_score".into(), snap.chaos_score.to_string()));
    for kind in ResourceType::ALL {
        let value = snap.resources.get(kind).ok_or_else(|| {
            SnapshotError::Unencodable(format!("resource {} has no value", kind.key()))
        })?;
        lines.push((resource_key(kind), value.to_string()));
    }
    lines.push(("history.count".into(), snap.history.len().to_string()));
    for (i, record) in snap.history.iter().enumerate() {
        if !is_valid_card_id(&record.card_id) {
            return Err(SnapshotError::Unencodable(format!(
                "history record {} has card id {:?}",
                i, record.card_id
            )));
        }
        lines.push((format!("history.{}", i), record.to_compact()));
    }
    lines.push(("saved_at".into(), snap.saved_at.to_string()));

    let body: String = lines
        .iter()
        .map(|(k, v)| format!("{}={}\n", k, v))
        .collect();
    let checksum = snapshot_checksum(&body);

    Ok(format!("{}\n{}checksum={}\n", HEADER, body, checksum))
}

/// SHA-256 of `body`. Lowercase hex string.
pub fn snapshot_checksum(body: &str) -> String {
    let digest = Sha256::digest(body.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn resource_key(kind: ResourceType) -> String {
    format!("resource.{}", kind.key())
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Parsed `key=value` entries with the line each came from.
struct Entries {
    values: BTreeMap<String, (usize, String)>,
}

impl Entries {
    fn take(&mut self, key: &str) -> Result<(usize, String), SnapshotError> {
        self.values
            .remove(key)
            .ok_or_else(|| SnapshotError::MissingKey(key.to_string()))
    }

    fn take_parsed<T: std::str::FromStr>(&mut self, key: &str) -> Result<T, SnapshotError> {
        let (line, raw) = self.take(key)?;
        raw.parse().map_err(|_| SnapshotError::Malformed {
            line,
            reason: format!("{} has invalid value {:?}", key, raw),
        })
    }
}

/// Decode snapshot text. Verifies the checksum but not kernel invariants.
pub fn decode_snapshot(text: &str) -> Result<SaveSnapshot, SnapshotError> {
    let mut body = String::new();
    let mut values = BTreeMap::new();
    let mut checksum: Option<String> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        if raw.trim().is_empty() || raw.starts_with('#') {
            continue;
        }
        if checksum.is_some() {
            return Err(SnapshotError::Malformed {
                line,
                reason: "content after checksum".to_string(),
            });
        }
        let (key, value) = raw.split_once('=').ok_or_else(|| SnapshotError::Malformed {
            line,
            reason: format!("expected key=value, got {:?}", raw),
        })?;
        if key == "checksum" {
            checksum = Some(value.to_string());
            continue;
        }
        if values
            .insert(key.to_string(), (line, value.to_string()))
            .is_some()
        {
            return Err(SnapshotError::DuplicateKey(key.to_string()));
        }
        body.push_str(key);
        body.push('=');
        body.push_str(value);
        body.push('\n');
    }

    let mut entries = Entries { values };

    let (_, format) = entries.take("format")?;
    if format != FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedFormat(format));
    }

    let expected = checksum.ok_or_else(|| SnapshotError::MissingKey("checksum".to_string()))?;
    let actual = snapshot_checksum(&body);
    if expected != actual {
        return Err(SnapshotError::ChecksumMismatch { expected, actual });
    }

    let current_day = entries.take_parsed("current_day")?;
    let total_decisions = entries.take_parsed("total_decisions")?;
    let chaos_score = entries.take_parsed("chaos_score")?;

    let mut resources = ResourceMap::new();
    for kind in ResourceType::ALL {
        resources.insert(kind, entries.take_parsed(&resource_key(kind))?);
    }

    let count: usize = entries.take_parsed("history.count")?;
    let mut history = Vec::with_capacity(count.min(entries.values.len()));
    for i in 0..count {
        let (line, raw) = entries.take(&format!("history.{}", i))?;
        let record = DecisionRecord::parse_compact(&raw).map_err(|e| SnapshotError::Malformed {
            line,
            reason: e.to_string(),
        })?;
        history.push(record);
    }

    let saved_at = entries.take_parsed("saved_at")?;

    if let Some(key) = entries.values.keys().next() {
        return Err(SnapshotError::UnknownKey(key.clone()));
    }

    Ok(SaveSnapshot {
        current_day,
        total_decisions,
        chaos_score,
        resources,
        history,
        saved_at,
    })
}

// ---------------------------------------------------------------------------
// Restore (decode + validate)
// ---------------------------------------------------------------------------

/// Decode, then validate kernel invariants on the rebuilt state.
///
/// This is the safe entry point for loading state from untrusted sources.
pub fn restore_snapshot(text: &str) -> Result<GameState, SnapshotError> {
    let snap = decode_snapshot(text)?;
    validate_snapshot(&snap)
}

/// Rebuild the state held by `snap` and check it against the kernel
/// invariants.
pub fn validate_snapshot(snap: &SaveSnapshot) -> Result<GameState, SnapshotError> {
    let state = snap.restore();
    try_validate_invariants(&state).map_err(SnapshotError::InvariantViolation)?;
    Ok(state)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
