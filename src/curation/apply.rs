//! Removal-list resolution for the curation apply step.
//!
//! The caller hands over positions already resolved as "every cluster member
//! except the retained one". Positions refer to the snapshot the duplicate
//! listing was computed against, so resolution is strict: duplicates collapse,
//! and an out-of-range position fails validation rather than being silently
//! dropped — a position past the end means the caller's snapshot is stale.
//! Removal itself is a single pass over a marking set; sequential positional
//! deletes would shift later indices mid-operation and are never used.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::knowledge::types::KnowledgeEntry;

/// Outcome of an apply-removal operation.
#[derive(Debug, Serialize)]
pub struct ApplyResult {
    /// Entries removed from the store.
    pub removed: usize,
    /// Entries remaining after the removal.
    pub kept: usize,
}

/// Collapse the removal list into a marking set, validating every position
/// against the current store length.
pub fn normalize_indices(remove: &[usize], len: usize) -> CoreResult<HashSet<usize>> {
    let mut marked = HashSet::with_capacity(remove.len());
    for &index in remove {
        if index >= len {
            return Err(CoreError::Validation(format!(
                "removal index {index} out of range for store of {len} entries"
            )));
        }
        marked.insert(index);
    }
    Ok(marked)
}

/// Keep every entry whose position is not in the marking set. One pass,
/// original order preserved.
pub fn filter_entries(
    entries: &[KnowledgeEntry],
    marked: &HashSet<usize>,
) -> Vec<KnowledgeEntry> {
    entries
        .iter()
        .enumerate()
        .filter(|(i, _)| !marked.contains(i))
        .map(|(_, entry)| entry.clone())
        .collect()
}
