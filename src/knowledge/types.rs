//! Canonical knowledge entry types and external-shape normalization.
//!
//! Source files in the wild carry entries under several field conventions
//! (`q`/`a`, `question`/`answer`, `input`/`output`, `input`/`text`).
//! [`RawEntry`] is the closed set of recognized shapes; [`RawEntry::normalize`]
//! is the single step that converts any of them into a [`KnowledgeEntry`]
//! before it enters the engine. Nothing downstream of the loader ever sees a
//! raw shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A curated question/answer record, the unit of the corpus.
///
/// Immutable once indexed — "editing" an entry means removing it through the
/// curation workflow and reinserting a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Question text.
    #[serde(rename = "q")]
    pub question: String,
    /// Answer text.
    #[serde(rename = "a")]
    pub answer: String,
    /// Where the entry came from (file, agent, "staging", ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Proposer confidence in `[0.0, 1.0]`, if the source recorded one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// When the entry was learned, if the source recorded it.
    #[serde(rename = "learned", skip_serializing_if = "Option::is_none")]
    pub learned_at: Option<DateTime<Utc>>,
}

impl KnowledgeEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            source: None,
            confidence: None,
            learned_at: None,
        }
    }

    /// Exact-duplicate key: both texts joined on a separator that cannot
    /// appear in either.
    pub fn dedup_key(&self) -> String {
        format!("{}\u{1f}{}", self.question, self.answer)
    }

    /// The text a document vector is built from.
    pub fn document_text(&self) -> String {
        format!("{} \n {}", self.question, self.answer)
    }
}

/// One of the recognized external entry shapes.
///
/// Variants are tried in order; extra fields are ignored. An item matching
/// none of them is unrecognized and gets skipped by the loader.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawEntry {
    Short {
        q: String,
        a: String,
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        confidence: Option<f64>,
        #[serde(default)]
        learned: Option<String>,
    },
    Long {
        question: String,
        answer: String,
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        confidence: Option<f64>,
        #[serde(default)]
        learned: Option<String>,
    },
    InputOutput {
        input: String,
        output: String,
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        confidence: Option<f64>,
        #[serde(default)]
        learned: Option<String>,
    },
    InputText {
        input: String,
        text: String,
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        confidence: Option<f64>,
        #[serde(default)]
        learned: Option<String>,
    },
}

impl RawEntry {
    /// Convert a recognized shape into the canonical entry.
    ///
    /// Texts are trimmed; an entry whose question or answer is empty after
    /// trimming is not a usable record and normalizes to `None`. A `learned`
    /// value that is not RFC 3339 is dropped rather than failing the entry.
    pub fn normalize(self) -> Option<KnowledgeEntry> {
        let (question, answer, source, confidence, learned) = match self {
            RawEntry::Short { q, a, source, confidence, learned } => {
                (q, a, source, confidence, learned)
            }
            RawEntry::Long { question, answer, source, confidence, learned } => {
                (question, answer, source, confidence, learned)
            }
            RawEntry::InputOutput { input, output, source, confidence, learned } => {
                (input, output, source, confidence, learned)
            }
            RawEntry::InputText { input, text, source, confidence, learned } => {
                (input, text, source, confidence, learned)
            }
        };

        let question = question.trim().to_string();
        let answer = answer.trim().to_string();
        if question.is_empty() || answer.is_empty() {
            return None;
        }

        let learned_at = learned
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Some(KnowledgeEntry {
            question,
            answer,
            source,
            confidence,
            learned_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_shapes_normalize_to_same_entry() {
        let shapes = [
            r#"{"q": "how to reset", "a": "use the portal"}"#,
            r#"{"question": "how to reset", "answer": "use the portal"}"#,
            r#"{"input": "how to reset", "output": "use the portal"}"#,
            r#"{"input": "how to reset", "text": "use the portal"}"#,
        ];
        for raw in shapes {
            let parsed: RawEntry = serde_json::from_str(raw).unwrap();
            let entry = parsed.normalize().unwrap();
            assert_eq!(entry.question, "how to reset");
            assert_eq!(entry.answer, "use the portal");
        }
    }

    #[test]
    fn test_optional_fields_carry_through() {
        let raw: RawEntry = serde_json::from_str(
            r#"{"q": "x", "a": "y", "source": "manual", "confidence": 0.7,
                "learned": "2026-01-15T10:00:00Z"}"#,
        )
        .unwrap();
        let entry = raw.normalize().unwrap();
        assert_eq!(entry.source.as_deref(), Some("manual"));
        assert_eq!(entry.confidence, Some(0.7));
        assert!(entry.learned_at.is_some());
    }

    #[test]
    fn test_blank_question_or_answer_normalizes_to_none() {
        let raw: RawEntry = serde_json::from_str(r#"{"q": "   ", "a": "y"}"#).unwrap();
        assert!(raw.normalize().is_none());
        let raw: RawEntry = serde_json::from_str(r#"{"q": "x", "a": ""}"#).unwrap();
        assert!(raw.normalize().is_none());
    }

    #[test]
    fn test_bad_learned_timestamp_is_dropped_not_fatal() {
        let raw: RawEntry =
            serde_json::from_str(r#"{"q": "x", "a": "y", "learned": "yesterday"}"#).unwrap();
        let entry = raw.normalize().unwrap();
        assert!(entry.learned_at.is_none());
    }

    #[test]
    fn test_dedup_key_separates_question_from_answer() {
        let a = KnowledgeEntry::new("ab", "c");
        let b = KnowledgeEntry::new("a", "bc");
        assert_ne!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_canonical_serialization_uses_short_names() {
        let entry = KnowledgeEntry::new("q-text", "a-text");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["q"], "q-text");
        assert_eq!(json["a"], "a-text");
        assert!(json.get("source").is_none());
    }
}
