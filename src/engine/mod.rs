//! The knowledge engine: an explicit context object owning store + index.
//!
//! The host (a CLI command, a test, a larger application) constructs the
//! engine and owns it; there is no global state. The index is an immutable
//! [`Arc`] snapshot swapped wholesale on rebuild, so a reader holding the
//! previous snapshot finishes its query against consistent data.

pub mod search;
pub mod stats;

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::curation::apply::{filter_entries, normalize_indices, ApplyResult};
use crate::curation::duplicates::{self, DuplicateGroup};
use crate::error::CoreResult;
use crate::knowledge::store::KnowledgeStore;
use crate::knowledge::types::KnowledgeEntry;
use crate::retrieval::tfidf::TfidfIndex;

pub use search::{SearchHit, SearchResponse};
pub use stats::EngineStats;

/// Result of an index rebuild.
#[derive(Debug, Serialize)]
pub struct IndexSummary {
    pub indexed: usize,
    pub terms: usize,
}

/// Result of a batch import.
#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub added: usize,
    pub duplicates: usize,
}

/// Store plus current index snapshot.
///
/// All mutation goes through this type, which keeps the in-memory entries,
/// the on-disk file, and the index moving together: the store is persisted
/// tmp-file-then-rename, the in-memory array is rolled back if that write
/// fails, and the index is rebuilt only after a successful persist.
#[derive(Debug)]
pub struct KnowledgeEngine {
    store: KnowledgeStore,
    index: Arc<TfidfIndex>,
}

impl KnowledgeEngine {
    /// Build an engine over `store`, indexing its current entries.
    pub fn new(store: KnowledgeStore) -> Self {
        let index = Arc::new(TfidfIndex::build(store.entries()));
        Self { store, index }
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Current index snapshot. Holders keep searching against it even if the
    /// engine rebuilds underneath them.
    #[allow(dead_code)]
    pub fn index(&self) -> Arc<TfidfIndex> {
        Arc::clone(&self.index)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Rebuild the index from the store's current entries and swap it in.
    pub fn reindex(&mut self) -> IndexSummary {
        let fresh = TfidfIndex::build(self.store.entries());
        let summary = IndexSummary {
            indexed: fresh.doc_count(),
            terms: fresh.distinct_terms(),
        };
        self.index = Arc::new(fresh);
        debug!(
            "reindexed {} entries, {} distinct terms",
            summary.indexed, summary.terms
        );
        summary
    }

    /// Rank the corpus against `query`; see [`search::search`].
    pub fn search(&self, query: &str, top_k: usize) -> CoreResult<SearchResponse> {
        search::search(self.store.entries(), &self.index, query, top_k)
    }

    /// Cluster near-duplicate entries at `threshold`; fresh clustering on
    /// every call.
    pub fn list_duplicates(&self, threshold: f64) -> CoreResult<Vec<DuplicateGroup>> {
        duplicates::list_duplicates(self.store.entries(), &self.index, threshold)
    }

    /// Remove the entries at `remove_indices` (positions in the current
    /// corpus order): validate and deduplicate the list, back up the store
    /// file, filter in one pass over a marking set, persist, re-index.
    ///
    /// An empty removal list is a no-op success and writes no backup. Any
    /// I/O failure leaves the in-memory entries and the on-disk file exactly
    /// as they were.
    pub fn apply_groups(&mut self, remove_indices: &[usize]) -> CoreResult<ApplyResult> {
        let marked = normalize_indices(remove_indices, self.store.len())?;
        if marked.is_empty() {
            return Ok(ApplyResult {
                removed: 0,
                kept: self.store.len(),
            });
        }

        self.store.write_backup()?;

        let kept_entries = filter_entries(self.store.entries(), &marked);
        let kept = kept_entries.len();
        let removed = self.store.len() - kept;

        let previous = self.store.entries().to_vec();
        self.store.set_entries(kept_entries);
        if let Err(err) = self.store.persist() {
            self.store.set_entries(previous);
            return Err(err);
        }

        self.reindex();
        info!("applied removals: {removed} removed, {kept} kept");
        Ok(ApplyResult { removed, kept })
    }

    /// Append one entry unless an exact (question, answer) twin already
    /// exists. Persists and re-indexes on success; returns whether the
    /// entry was added.
    pub fn append_entry(&mut self, entry: KnowledgeEntry) -> CoreResult<bool> {
        let key = entry.dedup_key();
        if self.store.entries().iter().any(|e| e.dedup_key() == key) {
            debug!("skipping exact duplicate entry: {}", entry.question);
            return Ok(false);
        }

        let previous = self.store.entries().to_vec();
        self.store.append(entry);
        if let Err(err) = self.store.persist() {
            self.store.set_entries(previous);
            return Err(err);
        }

        self.reindex();
        Ok(true)
    }

    /// Batch append with a single persist and a single rebuild. Exact
    /// duplicates, against the store and within the batch, are skipped.
    pub fn import_entries(&mut self, incoming: Vec<KnowledgeEntry>) -> CoreResult<ImportSummary> {
        let mut seen: HashSet<String> = self
            .store
            .entries()
            .iter()
            .map(|e| e.dedup_key())
            .collect();

        let previous = self.store.entries().to_vec();
        let mut added = 0usize;
        let mut duplicates = 0usize;
        for entry in incoming {
            if seen.insert(entry.dedup_key()) {
                self.store.append(entry);
                added += 1;
            } else {
                duplicates += 1;
            }
        }

        if added == 0 {
            return Ok(ImportSummary { added, duplicates });
        }
        if let Err(err) = self.store.persist() {
            self.store.set_entries(previous);
            return Err(err);
        }

        self.reindex();
        info!("imported {added} entries ({duplicates} duplicates skipped)");
        Ok(ImportSummary { added, duplicates })
    }

    /// Corpus statistics over the current snapshot.
    pub fn stats(&self) -> EngineStats {
        stats::engine_stats(&self.store, &self.index)
    }
}
