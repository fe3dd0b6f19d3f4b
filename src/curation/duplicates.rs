//! Near-duplicate detection over the indexed corpus.
//!
//! Greedy seed clustering: walk the corpus in order, compare each document's
//! TF-IDF vector against every seed found so far, and either join the best
//! seed at or above the threshold or become a new seed. Clustering runs
//! fresh on every call against the current snapshot — results are never
//! cached across mutations. Groups are valid only against the exact entry
//! array used to compute them.

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::knowledge::types::KnowledgeEntry;
use crate::retrieval::tfidf::{dot, TfidfIndex};

/// One entry inside a duplicate group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupMember {
    /// Position in the corpus snapshot the clustering ran against.
    pub index: usize,
    /// Similarity to the group's seed entry (the seed itself reports 1.0).
    pub similarity: f64,
    /// Snapshot copy of the entry, so review needs no re-fetch.
    pub entry: KnowledgeEntry,
}

/// A cluster of near-duplicate entries sharing one seed.
///
/// The caller is expected to retain exactly one member and treat the rest as
/// removal candidates.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    /// The seed entry's question text.
    pub key: String,
    /// Members sorted by similarity descending; the seed comes first.
    pub members: Vec<GroupMember>,
}

/// Cluster `entries` by similarity at `threshold`, reporting only clusters
/// with at least two members.
pub fn list_duplicates(
    entries: &[KnowledgeEntry],
    index: &TfidfIndex,
    threshold: f64,
) -> CoreResult<Vec<DuplicateGroup>> {
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(CoreError::Validation(format!(
            "duplicate threshold must be in (0, 1], got {threshold}"
        )));
    }
    debug_assert_eq!(entries.len(), index.vectors().len());

    let vectors = index.vectors();

    // clusters[k] = (seed index, members as (index, similarity-to-seed))
    let mut clusters: Vec<(usize, Vec<(usize, f64)>)> = Vec::new();
    for i in 0..entries.len() {
        let mut best: Option<(usize, f64)> = None;
        for (cluster_pos, (seed, _)) in clusters.iter().enumerate() {
            let similarity = dot(&vectors[i], &vectors[*seed]);
            if similarity > best.map_or(0.0, |(_, s)| s) {
                best = Some((cluster_pos, similarity));
            }
        }
        match best {
            Some((cluster_pos, similarity)) if similarity >= threshold => {
                clusters[cluster_pos].1.push((i, similarity));
            }
            _ => clusters.push((i, vec![(i, 1.0)])),
        }
    }

    let groups = clusters
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(seed, mut members)| {
            members.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            DuplicateGroup {
                key: entries[seed].question.clone(),
                members: members
                    .into_iter()
                    .map(|(index, similarity)| GroupMember {
                        index,
                        similarity,
                        entry: entries[index].clone(),
                    })
                    .collect(),
            }
        })
        .collect();

    Ok(groups)
}
