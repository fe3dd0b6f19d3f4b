//! TF-IDF retrieval over an indexed corpus snapshot.

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::knowledge::types::KnowledgeEntry;
use crate::retrieval::tfidf::{dot, TfidfIndex};

// ── Public types ──────────────────────────────────────────────────────────────

/// A single ranked hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub score: f64,
    /// Position of the entry in the corpus snapshot the query ran against.
    pub index: usize,
    pub entry: KnowledgeEntry,
}

/// Response from a retrieval query.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Rank `entries` against `query`, best first, at most `top_k` results.
///
/// Documents with non-positive similarity are excluded entirely; an empty
/// corpus yields an empty result set rather than an error. Output is
/// deterministic: the same corpus and query produce bit-identical rankings.
pub fn search(
    entries: &[KnowledgeEntry],
    index: &TfidfIndex,
    query: &str,
    top_k: usize,
) -> CoreResult<SearchResponse> {
    if top_k == 0 {
        return Err(CoreError::Validation("top_k must be at least 1".into()));
    }
    if query.trim().is_empty() {
        return Err(CoreError::Validation("query must not be blank".into()));
    }
    if entries.is_empty() {
        return Ok(SearchResponse {
            results: Vec::new(),
        });
    }
    debug_assert_eq!(entries.len(), index.vectors().len());

    let query_vector = index.vectorize_query(query);
    let mut results: Vec<SearchHit> = index
        .vectors()
        .iter()
        .enumerate()
        .filter_map(|(i, vector)| {
            let score = dot(&query_vector, vector);
            (score > 0.0).then(|| SearchHit {
                score,
                index: i,
                entry: entries[i].clone(),
            })
        })
        .collect();

    // stable sort: equal scores keep corpus order
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(top_k);
    Ok(SearchResponse { results })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(q: &str, a: &str) -> KnowledgeEntry {
        KnowledgeEntry::new(q, a)
    }

    fn corpus() -> Vec<KnowledgeEntry> {
        vec![
            entry("How do I reset my password?", "Click 'forgot password' on the login page."),
            entry("How do I change my email?", "Open account settings and edit the address."),
            entry("What is the refund policy?", "Refunds within 30 days of purchase."),
            entry("password reset link expired", "Request a fresh reset link from the login page."),
        ]
    }

    fn indexed(entries: &[KnowledgeEntry]) -> TfidfIndex {
        TfidfIndex::build(entries)
    }

    #[test]
    fn test_rejects_blank_query_and_zero_top_k() {
        let entries = corpus();
        let index = indexed(&entries);
        assert!(search(&entries, &index, "   ", 5).is_err());
        assert!(search(&entries, &index, "password", 0).is_err());
    }

    #[test]
    fn test_empty_corpus_succeeds_with_no_results() {
        let entries: Vec<KnowledgeEntry> = Vec::new();
        let index = indexed(&entries);
        let response = search(&entries, &index, "anything", 5).unwrap();
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_reset_password_ranks_password_entries_first() {
        let entries = corpus();
        let index = indexed(&entries);
        let response = search(&entries, &index, "reset password", 10).unwrap();

        assert!(!response.results.is_empty());
        // both password entries outrank the refund entry, which never matches
        let top_questions: Vec<&str> = response
            .results
            .iter()
            .map(|h| h.entry.question.as_str())
            .collect();
        assert!(top_questions[0].contains("password"));
        assert!(!top_questions.contains(&"What is the refund policy?"));
    }

    #[test]
    fn test_scores_descend_and_truncate_to_top_k() {
        let entries = corpus();
        let index = indexed(&entries);
        let response = search(&entries, &index, "password reset login", 2).unwrap();

        assert_eq!(response.results.len(), 2);
        assert!(response.results[0].score >= response.results[1].score);
        for hit in &response.results {
            assert!(hit.score > 0.0);
        }
    }

    #[test]
    fn test_non_matching_documents_are_excluded() {
        let entries = corpus();
        let index = indexed(&entries);
        let response = search(&entries, &index, "refund", 10).unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].entry.question, "What is the refund policy?");
    }

    #[test]
    fn test_equal_scores_tiebreak_on_corpus_order() {
        let entries = vec![
            entry("alpha beta", "gamma"),
            entry("alpha beta", "gamma"),
            entry("unrelated", "thing"),
        ];
        let index = indexed(&entries);
        let response = search(&entries, &index, "alpha", 10).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].index, 0);
        assert_eq!(response.results[1].index, 1);
    }

    #[test]
    fn test_identical_runs_are_bit_identical() {
        let entries = corpus();
        let index = indexed(&entries);
        let first = search(&entries, &index, "reset password", 5).unwrap();
        let second = search(&entries, &index, "reset password", 5).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
