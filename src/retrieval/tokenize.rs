//! Corpus tokenization.
//!
//! One scheme shared by document indexing and query vectorization: lowercase,
//! split on any non-alphanumeric boundary, drop single-character tokens and
//! tokens that are purely numeric.

/// Split `text` into index terms.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() > 1 && !t.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}
