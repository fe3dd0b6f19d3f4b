//! Corpus statistics.

use serde::Serialize;

use crate::knowledge::store::KnowledgeStore;
use crate::retrieval::tfidf::TfidfIndex;

/// Snapshot statistics over the store and its index.
#[derive(Debug, Serialize)]
pub struct EngineStats {
    pub entries: usize,
    pub distinct_terms: usize,
    pub store_bytes: u64,
    pub backups: usize,
}

/// Compute store and index statistics.
pub fn engine_stats(store: &KnowledgeStore, index: &TfidfIndex) -> EngineStats {
    EngineStats {
        entries: store.len(),
        distinct_terms: index.distinct_terms(),
        store_bytes: store.file_size(),
        backups: store.backup_count(),
    }
}
