//! Source-file loading and corpus assembly.
//!
//! Merges one or more JSON source files of raw entries into a deduplicated,
//! canonical corpus. A file that cannot be read or parsed is skipped with a
//! warning and loading continues — a single bad source never takes down
//! indexing. Unrecognized items inside a good file are skipped and counted
//! the same way.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::knowledge::types::{KnowledgeEntry, RawEntry};

/// What a load pass produced, with counters for what it had to skip.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Canonical entries, deduplicated by exact (question, answer) key,
    /// first occurrence wins, in source order.
    pub entries: Vec<KnowledgeEntry>,
    /// Files successfully read and parsed.
    pub files_read: usize,
    /// Files skipped because they were unreadable or not valid JSON.
    pub files_skipped: usize,
    /// Items skipped because they matched no recognized shape or were blank.
    pub skipped_items: usize,
}

/// Merge the given source files into one deduplicated corpus.
pub fn load_sources(paths: &[PathBuf]) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();
    let mut merged: Vec<KnowledgeEntry> = Vec::new();

    for path in paths {
        match read_source(path) {
            Ok(values) => {
                outcome.files_read += 1;
                let (entries, skipped) = normalize_values(values);
                outcome.skipped_items += skipped;
                merged.extend(entries);
            }
            Err(err) => {
                outcome.files_skipped += 1;
                warn!("skipping source {}: {err}", path.display());
            }
        }
    }

    outcome.entries = dedup_exact(merged);
    debug!(
        "loaded {} entries from {} files ({} skipped files, {} skipped items)",
        outcome.entries.len(),
        outcome.files_read,
        outcome.files_skipped,
        outcome.skipped_items
    );
    outcome
}

/// Read one source file into its raw item values.
fn read_source(path: &Path) -> CoreResult<Vec<serde_json::Value>> {
    let raw =
        std::fs::read_to_string(path).map_err(|e| CoreError::Input(e.to_string()))?;
    parse_document(&raw).map_err(|e| CoreError::Input(e.to_string()))
}

/// Parse a source document: a bare JSON array, or the legacy object root
/// holding the array under `qa`.
pub(crate) fn parse_document(raw: &str) -> Result<Vec<serde_json::Value>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    Ok(match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj.remove("qa") {
            Some(serde_json::Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    })
}

/// Run every raw value through the normalization step, counting the skips.
pub(crate) fn normalize_values(
    values: Vec<serde_json::Value>,
) -> (Vec<KnowledgeEntry>, usize) {
    let mut entries = Vec::with_capacity(values.len());
    let mut skipped = 0usize;
    for value in values {
        match serde_json::from_value::<RawEntry>(value) {
            Ok(raw) => match raw.normalize() {
                Some(entry) => entries.push(entry),
                None => skipped += 1,
            },
            Err(_) => skipped += 1,
        }
    }
    (entries, skipped)
}

/// Drop exact (question, answer) duplicates, keeping the first occurrence.
pub(crate) fn dedup_exact(entries: Vec<KnowledgeEntry>) -> Vec<KnowledgeEntry> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::with_capacity(entries.len());
    for entry in entries {
        if seen.insert(entry.dedup_key()) {
            unique.push(entry);
        }
    }
    unique
}
