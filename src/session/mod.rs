//! Session logging: sanitized append-only JSONL with token-budget trims.

pub mod log;
pub mod sanitize;

pub use log::{
    estimate_tokens, estimate_tokens_by_words, LogEntry, SessionLog, TrimResult,
};
pub use sanitize::{redact_paths, REDACTION_MARKER};
