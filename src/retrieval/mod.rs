pub mod tfidf;
pub mod tokenize;

pub use tfidf::{dot, DocumentVector, TfidfIndex};
pub use tokenize::tokenize;
