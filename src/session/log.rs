//! The append-only session log.
//!
//! One JSON object per line in a durable file, mirrored in memory. Entries
//! are sanitized and timestamped on the way in and never mutated afterwards;
//! the only removals are a full [`SessionLog::clear`] or the oldest-first
//! eviction of [`SessionLog::trim_to_token_budget`]. Reads tolerate trailing
//! corruption: a line that does not parse is wrapped into a best-effort
//! record instead of poisoning the whole log.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::session::sanitize::redact_paths;

/// A single log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// UUID v7, stamped on add when the caller supplies none.
    #[serde(default = "new_id")]
    pub id: String,
    /// Speaker role (`"user"`, `"assistant"`, ...).
    #[serde(default = "default_role")]
    pub role: String,
    /// Sanitized entry text.
    pub text: String,
    /// Arbitrary metadata attached by the caller.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub meta: serde_json::Map<String, serde_json::Value>,
    /// Entry timestamp, stamped on add when absent.
    #[serde(rename = "at", default = "Utc::now")]
    pub at: DateTime<Utc>,
}

fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

fn default_role() -> String {
    "user".to_string()
}

/// Outcome of a token-budget trim.
#[derive(Debug, Serialize)]
pub struct TrimResult {
    /// Entries retained (the newest ones that fit the budget).
    pub kept: usize,
    /// Entries evicted (everything older).
    pub removed: usize,
    /// Accumulated estimated token cost of the kept entries.
    pub token_count: usize,
}

/// Default token estimator: `ceil(chars / 4)`.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Word-based estimator: `ceil(words × 1.3)`.
#[allow(dead_code)]
pub fn estimate_tokens_by_words(text: &str) -> usize {
    (text.split_whitespace().count() as f64 * 1.3).ceil() as usize
}

/// JSONL-backed append-only log.
#[derive(Debug)]
pub struct SessionLog {
    path: PathBuf,
    entries: Vec<LogEntry>,
}

impl SessionLog {
    /// Open the log at `path`, wrapping any unparsable line into a
    /// best-effort record. A missing file is an empty log.
    pub fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self {
                    path,
                    entries: Vec::new(),
                });
            }
            Err(e) => return Err(CoreError::io(path.display().to_string(), e)),
        };

        let mut entries = Vec::new();
        for line in raw.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<LogEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    warn!("wrapping corrupt log line: {err}");
                    entries.push(LogEntry {
                        id: new_id(),
                        role: "unknown".to_string(),
                        text: line.to_string(),
                        meta: serde_json::Map::new(),
                        at: Utc::now(),
                    });
                }
            }
        }
        Ok(Self { path, entries })
    }

    /// Sanitize, stamp, store, and durably append one entry. Returns the
    /// record as stored.
    pub fn add(
        &mut self,
        role: &str,
        text: &str,
        meta: serde_json::Map<String, serde_json::Value>,
    ) -> CoreResult<LogEntry> {
        let role = if role.trim().is_empty() { "user" } else { role };
        let entry = LogEntry {
            id: new_id(),
            role: role.to_string(),
            text: redact_paths(text),
            meta,
            at: Utc::now(),
        };

        self.append_line(&entry)?;
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Case-insensitive substring match over entry text and serialized
    /// metadata, most recent first, at most `limit` results.
    pub fn query(&self, needle: &str, limit: usize) -> CoreResult<Vec<LogEntry>> {
        if needle.trim().is_empty() {
            return Err(CoreError::Validation("query needle must not be blank".into()));
        }
        if limit == 0 {
            return Err(CoreError::Validation("query limit must be at least 1".into()));
        }

        let needle = needle.to_lowercase();
        let mut matched: Vec<&LogEntry> = self
            .entries
            .iter()
            .rev()
            .filter(|entry| {
                if entry.text.to_lowercase().contains(&needle) {
                    return true;
                }
                if entry.meta.is_empty() {
                    return false;
                }
                serde_json::to_string(&entry.meta)
                    .map(|meta| meta.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .collect();
        matched.sort_by(|a, b| b.at.cmp(&a.at));
        Ok(matched.into_iter().take(limit).cloned().collect())
    }

    /// Trim with the default `ceil(chars / 4)` estimator.
    pub fn trim_to_token_budget(&mut self, max_tokens: usize) -> CoreResult<TrimResult> {
        self.trim_to_token_budget_with(max_tokens, estimate_tokens)
    }

    /// Walk entries newest → oldest accumulating estimated cost; stop before
    /// the entry that would exceed `max_tokens`, evict everything older, and
    /// persist what remains.
    ///
    /// If the single newest entry alone exceeds the budget the log may
    /// legitimately keep zero entries.
    pub fn trim_to_token_budget_with(
        &mut self,
        max_tokens: usize,
        estimator: impl Fn(&str) -> usize,
    ) -> CoreResult<TrimResult> {
        let prior = self.entries.len();
        let mut token_count = 0usize;
        let mut kept_rev: Vec<LogEntry> = Vec::new();

        for entry in self.entries.iter().rev() {
            let cost = estimator(&entry.text);
            if token_count + cost > max_tokens {
                break;
            }
            token_count += cost;
            kept_rev.push(entry.clone());
        }

        kept_rev.reverse();
        let kept = kept_rev.len();
        self.entries = kept_rev;
        self.rewrite()?;

        debug!("trimmed log to {kept} entries ({token_count} tokens)");
        Ok(TrimResult {
            kept,
            removed: prior - kept,
            token_count,
        })
    }

    /// Entries in insertion order.
    pub fn all(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and truncate the file.
    pub fn clear(&mut self) -> CoreResult<()> {
        self.entries.clear();
        self.rewrite()
    }

    /// Write a snapshot of all entries as JSONL to `dest`.
    pub fn export_archive(&self, dest: impl AsRef<Path>) -> CoreResult<()> {
        let dest = dest.as_ref();
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CoreError::io(parent.display().to_string(), e))?;
            }
        }
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        std::fs::write(dest, out).map_err(|e| CoreError::io(dest.display().to_string(), e))?;
        Ok(())
    }

    fn append_line(&self, entry: &LogEntry) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CoreError::io(parent.display().to_string(), e))?;
            }
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CoreError::io(self.path.display().to_string(), e))?;
        let line = serde_json::to_string(entry)?;
        writeln!(file, "{line}")
            .map_err(|e| CoreError::io(self.path.display().to_string(), e))?;
        Ok(())
    }

    fn rewrite(&self) -> CoreResult<()> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        std::fs::write(&self.path, out)
            .map_err(|e| CoreError::io(self.path.display().to_string(), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_log(dir: &tempfile::TempDir) -> SessionLog {
        SessionLog::open(dir.path().join("session.jsonl")).unwrap()
    }

    fn meta(pairs: &[(&str, &str)]) -> serde_json::Map<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn test_appended_entries_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = open_log(&dir);
        for i in 0..5 {
            log.add("user", &format!("message {i}"), serde_json::Map::new())
                .unwrap();
        }

        assert_eq!(log.len(), 5);
        for (i, entry) in log.all().iter().enumerate() {
            assert_eq!(entry.text, format!("message {i}"));
        }

        // durable: a fresh open sees the same sequence
        let reopened = open_log(&dir);
        assert_eq!(reopened.len(), 5);
        assert_eq!(reopened.all()[0].text, "message 0");
        assert_eq!(reopened.all()[4].text, "message 4");
    }

    #[test]
    fn test_add_sanitizes_and_stamps() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = open_log(&dir);
        let stored = log
            .add("assistant", "see /etc/passwd for details", serde_json::Map::new())
            .unwrap();
        assert_eq!(stored.text, "see [REDACTED_PATH] for details");
        assert!(!stored.id.is_empty());
        assert_eq!(stored.role, "assistant");
    }

    #[test]
    fn test_blank_role_defaults_to_user() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = open_log(&dir);
        let stored = log.add("  ", "hello", serde_json::Map::new()).unwrap();
        assert_eq!(stored.role, "user");
    }

    #[test]
    fn test_query_matches_text_and_meta_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = open_log(&dir);
        log.add("user", "Deploy went FINE", serde_json::Map::new())
            .unwrap();
        log.add("user", "unrelated chatter", meta(&[("topic", "deploy")]))
            .unwrap();
        log.add("user", "lunch plans", serde_json::Map::new()).unwrap();

        let hits = log.query("deploy", 10).unwrap();
        assert_eq!(hits.len(), 2);
        // most recent first: the meta match came after the text match
        assert_eq!(hits[0].text, "unrelated chatter");
        assert_eq!(hits[1].text, "Deploy went FINE");

        let limited = log.query("deploy", 1).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].text, "unrelated chatter");
    }

    #[test]
    fn test_query_validates_needle_and_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = open_log(&dir);
        log.add("user", "something", serde_json::Map::new()).unwrap();
        assert!(log.query("   ", 5).is_err());
        assert!(log.query("something", 0).is_err());
    }

    #[test]
    fn test_trim_zero_budget_keeps_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = open_log(&dir);
        for i in 0..4 {
            log.add("user", &format!("entry number {i}"), serde_json::Map::new())
                .unwrap();
        }

        let result = log.trim_to_token_budget(0).unwrap();
        assert_eq!(result.kept, 0);
        assert_eq!(result.removed, 4);
        assert_eq!(result.token_count, 0);
        assert!(log.is_empty());
        // durable too
        assert!(open_log(&dir).is_empty());
    }

    #[test]
    fn test_trim_keeps_newest_entries_within_budget() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = open_log(&dir);
        // each text is 20 chars -> 5 tokens
        for i in 0..5 {
            log.add("user", &format!("aaaaaaaaaaaaaaaaaa{i:02}"), serde_json::Map::new())
                .unwrap();
        }

        let result = log.trim_to_token_budget(12).unwrap();
        // two newest fit (10 tokens); a third would exceed 12
        assert_eq!(result.kept, 2);
        assert_eq!(result.removed, 3);
        assert_eq!(result.token_count, 10);
        assert_eq!(log.all()[0].text, "aaaaaaaaaaaaaaaaaa03");
        assert_eq!(log.all()[1].text, "aaaaaaaaaaaaaaaaaa04");
    }

    #[test]
    fn test_trim_may_keep_zero_when_newest_alone_exceeds_budget() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = open_log(&dir);
        log.add("user", &"x".repeat(400), serde_json::Map::new()).unwrap();

        let result = log.trim_to_token_budget(50).unwrap();
        assert_eq!(result.kept, 0);
        assert_eq!(result.removed, 1);
    }

    #[test]
    fn test_trim_with_generous_budget_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = open_log(&dir);
        for i in 0..3 {
            log.add("user", &format!("short {i}"), serde_json::Map::new())
                .unwrap();
        }

        let result = log.trim_to_token_budget(10_000).unwrap();
        assert_eq!(result.kept, 3);
        assert_eq!(result.removed, 0);
    }

    #[test]
    fn test_trim_with_word_estimator() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = open_log(&dir);
        log.add("user", "one two three four five", serde_json::Map::new())
            .unwrap();

        let result = log
            .trim_to_token_budget_with(10, estimate_tokens_by_words)
            .unwrap();
        // 5 words * 1.3 -> 7 tokens, fits in 10
        assert_eq!(result.kept, 1);
        assert_eq!(result.token_count, 7);
    }

    #[test]
    fn test_corrupt_line_is_wrapped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        {
            let mut log = SessionLog::open(&path).unwrap();
            log.add("user", "first", serde_json::Map::new()).unwrap();
        }
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "this is not json at all").unwrap();
        {
            let mut log = SessionLog::open(&path).unwrap();
            log.add("user", "after the corruption", serde_json::Map::new())
                .unwrap();
        }

        let log = SessionLog::open(&path).unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log.all()[0].text, "first");
        assert_eq!(log.all()[1].text, "this is not json at all");
        assert_eq!(log.all()[1].role, "unknown");
        assert_eq!(log.all()[2].text, "after the corruption");
    }

    #[test]
    fn test_missing_timestamp_and_id_are_stamped_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        std::fs::write(&path, "{\"text\": \"bare entry\"}\n").unwrap();

        let log = SessionLog::open(&path).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.all()[0].text, "bare entry");
        assert_eq!(log.all()[0].role, "user");
        assert!(!log.all()[0].id.is_empty());
    }

    #[test]
    fn test_clear_empties_memory_and_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = open_log(&dir);
        log.add("user", "soon gone", serde_json::Map::new()).unwrap();
        log.clear().unwrap();
        assert!(log.is_empty());
        assert!(open_log(&dir).is_empty());
    }

    #[test]
    fn test_export_archive_writes_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = open_log(&dir);
        log.add("user", "keep this", serde_json::Map::new()).unwrap();

        let dest = dir.path().join("archive").join("session-archive.jsonl");
        log.export_archive(&dest).unwrap();
        let raw = std::fs::read_to_string(&dest).unwrap();
        assert_eq!(raw.lines().count(), 1);
        assert!(raw.contains("keep this"));
    }

    #[test]
    fn test_token_estimators() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens_by_words("one two three"), 4); // 3 * 1.3 -> 3.9 -> 4
    }
}
