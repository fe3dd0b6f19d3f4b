//! Core error kinds.
//!
//! Every public operation reports failure through one of these variants so a
//! hosting collaborator can branch on the kind without string matching.
//! Recovery expectations differ per variant: [`CoreError::Input`] is skipped
//! locally, [`CoreError::Validation`] is a boundary rejection,
//! [`CoreError::Io`] fails a single operation with the store untouched, and
//! the network variants are surfaced without retry.

/// Failure kinds for engine, curation, log, and generation operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed source entry or unreadable source file. Recovered locally;
    /// the offending item or file is skipped and processing continues.
    #[error("invalid input: {0}")]
    Input(String),

    /// Query, limit, threshold, or index outside accepted bounds. Rejected
    /// at the boundary, never propagated as a fault.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Backup or persist failure. Fatal to that single operation; the store
    /// is left exactly as it was before the attempt.
    #[error("io failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Generation service unreachable or returned a non-success status.
    #[error("generation service error: {0}")]
    Network(String),

    /// Generation request exceeded the configured timeout and was aborted.
    #[error("generation request timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// JSON that must decode (store, staging) failed to parse.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CoreError {
    /// Wrap an io::Error with the path it occurred on.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
