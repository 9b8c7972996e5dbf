//! Plugin identifier generation
//!
//! Identifiers are UUID-shaped: five groups of uppercase hex digits
//! (`8-4-4-4-12`, e.g. `3F2B4C1A-9D3E-5F20-A1B2-C3D4E5F60718`).
//!
//! Hash is derived from a seed (usually the plugin name) + creation timestamp
//! + a process-local counter, so identifiers minted in the same nanosecond
//! still differ.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Group lengths of a generated identifier
const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// Generates a new identifier from a seed and timestamp
pub fn new_identifier(seed: &str, timestamp: DateTime<Utc>) -> String {
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let input = format!(
        "{}{}{}",
        seed,
        timestamp.timestamp_nanos_opt().unwrap_or(0),
        sequence
    );
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex().to_ascii_uppercase();

    let mut groups = Vec::with_capacity(GROUPS.len());
    let mut start = 0;
    for len in GROUPS {
        groups.push(&hex[start..start + len]);
        start += len;
    }
    groups.join("-")
}

/// Returns true if `s` has the shape of a generated identifier
pub fn is_generated_identifier(s: &str) -> bool {
    let groups: Vec<&str> = s.split('-').collect();
    groups.len() == GROUPS.len()
        && groups
            .iter()
            .zip(GROUPS)
            .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit()))
}
