//! TF-IDF index construction and query vectorization.
//!
//! Each document becomes a sparse term → weight map with unit L2 norm, in
//! strict 1:1 positional correspondence with the entry slice it was built
//! from. Vectors are `BTreeMap`s so iteration — and therefore floating-point
//! summation order — is stable, which makes ranked output bit-identical for
//! identical input. The index is built in one shot and never mutated; any
//! corpus change means a full rebuild.

use std::collections::BTreeMap;

use crate::knowledge::types::KnowledgeEntry;
use crate::retrieval::tokenize::tokenize;

/// Sparse term-weight vector with unit L2 norm.
pub type DocumentVector = BTreeMap<String, f64>;

/// An immutable TF-IDF index over one corpus snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfIndex {
    doc_count: usize,
    df: BTreeMap<String, usize>,
    vectors: Vec<DocumentVector>,
}

impl TfidfIndex {
    /// Build the index for `entries`, in entry order.
    pub fn build(entries: &[KnowledgeEntry]) -> Self {
        let doc_terms: Vec<Vec<String>> = entries
            .iter()
            .map(|e| tokenize(&e.document_text()))
            .collect();

        // Document frequency: each term counted once per document.
        let mut df: BTreeMap<String, usize> = BTreeMap::new();
        for terms in &doc_terms {
            let mut seen = std::collections::HashSet::new();
            for term in terms {
                if seen.insert(term.as_str()) {
                    *df.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        let n = doc_terms.len().max(1);
        let vectors = doc_terms
            .into_iter()
            .map(|terms| weigh(terms, &df, n))
            .collect();

        Self {
            doc_count: entries.len(),
            df,
            vectors,
        }
    }

    /// Vectorize a query with the corpus document-frequency table. Terms the
    /// corpus has never seen get idf computed with `df = 0`.
    pub fn vectorize_query(&self, query: &str) -> DocumentVector {
        weigh(tokenize(query), &self.df, self.doc_count.max(1))
    }

    /// Document vectors, positionally aligned with the entry slice the index
    /// was built from.
    pub fn vectors(&self) -> &[DocumentVector] {
        &self.vectors
    }

    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    /// Number of distinct terms across the corpus.
    pub fn distinct_terms(&self) -> usize {
        self.df.len()
    }
}

/// Term-frequency weighting with `idf = ln(1 + N / (1 + df))`, L2-normalized.
fn weigh(terms: Vec<String>, df: &BTreeMap<String, usize>, n: usize) -> DocumentVector {
    let mut tf: BTreeMap<String, usize> = BTreeMap::new();
    for term in terms {
        *tf.entry(term).or_insert(0) += 1;
    }

    let mut vector: DocumentVector = BTreeMap::new();
    let mut norm_sq = 0.0;
    for (term, count) in tf {
        let doc_freq = df.get(&term).copied().unwrap_or(0);
        let idf = (1.0 + n as f64 / (1.0 + doc_freq as f64)).ln();
        let weight = count as f64 * idf;
        norm_sq += weight * weight;
        vector.insert(term, weight);
    }

    let norm = norm_sq.sqrt();
    // a document with no surviving tokens keeps an empty vector
    let norm = if norm > 0.0 { norm } else { 1.0 };
    for weight in vector.values_mut() {
        *weight /= norm;
    }
    vector
}

/// Sparse dot product, iterating the smaller map and probing the larger.
pub fn dot(a: &DocumentVector, b: &DocumentVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut sum = 0.0;
    for (term, weight) in small {
        if let Some(other) = large.get(term) {
            sum += weight * other;
        }
    }
    sum
}
