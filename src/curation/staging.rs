//! Staging intake — candidate entries awaiting human review.
//!
//! Candidates proposed by external collaborators land in a JSONL intake file
//! and move through a small lifecycle: `pending` until a reviewer approves
//! them into the authoritative store or rejects them with a reason. Submission
//! refuses exact resubmissions inside a short window so a retrying proposer
//! cannot flood the intake.

use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::engine::KnowledgeEngine;
use crate::error::{CoreError, CoreResult};
use crate::knowledge::types::KnowledgeEntry;

/// How many trailing intake items the duplicate window scans.
const DUPLICATE_LOOKBACK: usize = 200;
/// Window within which an exact (question, answer) resubmission is refused.
const DUPLICATE_WINDOW_SECS: i64 = 120;

/// Review status of a staged candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingStatus {
    /// Awaiting review.
    Pending,
    /// Accepted into the authoritative store.
    Approved,
    /// Declined, with a recorded reason.
    Rejected,
}

impl StagingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for StagingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StagingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("unknown staging status: {s}")),
        }
    }
}

/// A candidate knowledge entry in the intake file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingItem {
    /// UUID v7 (time-sortable).
    pub id: String,
    /// Candidate question text.
    #[serde(rename = "q")]
    pub question: String,
    /// Candidate answer text.
    #[serde(rename = "a")]
    pub answer: String,
    /// Proposer identity, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Proposer confidence, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Review status.
    pub status: StagingStatus,
    /// When the candidate entered the intake.
    pub submitted_at: DateTime<Utc>,
    /// When it was approved or rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    /// Why it was rejected (`"manual"` when no reason was given).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

/// Result of a submission attempt.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The candidate was appended to the intake.
    Accepted(StagingItem),
    /// An identical submission landed within the duplicate window.
    RecentDuplicate,
}

/// Per-status intake counts.
#[derive(Debug, Default, Serialize)]
pub struct StagingCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

/// Handle to the staging intake file.
#[derive(Debug)]
pub struct StagingArea {
    path: PathBuf,
}

impl StagingArea {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read every intake item. A missing file is an empty intake; a corrupt
    /// line is skipped with a warning.
    pub fn load(&self) -> CoreResult<Vec<StagingItem>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CoreError::io(self.path.display().to_string(), e)),
        };

        let mut items = Vec::new();
        for line in raw.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<StagingItem>(line) {
                Ok(item) => items.push(item),
                Err(err) => warn!("skipping corrupt staging line: {err}"),
            }
        }
        Ok(items)
    }

    /// Rewrite the intake file with the given items.
    fn save(&self, items: &[StagingItem]) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CoreError::io(parent.display().to_string(), e))?;
            }
        }
        let mut out = String::new();
        for item in items {
            out.push_str(&serde_json::to_string(item)?);
            out.push('\n');
        }
        std::fs::write(&self.path, out)
            .map_err(|e| CoreError::io(self.path.display().to_string(), e))?;
        Ok(())
    }

    /// Submit a candidate to the intake, refusing exact resubmissions inside
    /// the duplicate window.
    pub fn submit(
        &self,
        question: &str,
        answer: &str,
        source: Option<String>,
        confidence: Option<f64>,
    ) -> CoreResult<SubmitOutcome> {
        let question = question.trim();
        let answer = answer.trim();
        if question.is_empty() || answer.is_empty() {
            return Err(CoreError::Validation(
                "staging submission needs non-empty question and answer".into(),
            ));
        }

        let items = self.load()?;
        let now = Utc::now();
        let tail = items.iter().rev().take(DUPLICATE_LOOKBACK);
        for prior in tail {
            if prior.question == question
                && prior.answer == answer
                && (now - prior.submitted_at).num_seconds().abs() <= DUPLICATE_WINDOW_SECS
            {
                return Ok(SubmitOutcome::RecentDuplicate);
            }
        }

        let item = StagingItem {
            id: uuid::Uuid::now_v7().to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            source,
            confidence,
            status: StagingStatus::Pending,
            submitted_at: now,
            decided_at: None,
            rejection_reason: None,
        };

        self.append_line(&item)?;
        info!("staged candidate {}", item.id);
        Ok(SubmitOutcome::Accepted(item))
    }

    /// Pending items, deduplicated by normalized (question, answer) signature
    /// keeping the latest submission, oldest first.
    pub fn list_pending(&self) -> CoreResult<Vec<StagingItem>> {
        let items = self.load()?;
        let mut by_signature: std::collections::HashMap<String, StagingItem> =
            std::collections::HashMap::new();

        for item in items {
            if item.status != StagingStatus::Pending {
                continue;
            }
            let signature = format!(
                "{}\u{1f}{}",
                normalize_text(&item.question),
                normalize_text(&item.answer)
            );
            match by_signature.get(&signature) {
                Some(existing) if existing.submitted_at > item.submitted_at => {}
                _ => {
                    by_signature.insert(signature, item);
                }
            }
        }

        let mut pending: Vec<StagingItem> = by_signature.into_values().collect();
        pending.sort_by_key(|item| item.submitted_at);
        Ok(pending)
    }

    /// Approve a pending item: append its entry to the authoritative store
    /// (which persists and re-indexes) and record the decision.
    pub fn approve(
        &self,
        engine: &mut KnowledgeEngine,
        id: &str,
    ) -> CoreResult<StagingItem> {
        let mut items = self.load()?;
        let position = find_pending(&items, id)?;

        let entry = KnowledgeEntry {
            question: items[position].question.clone(),
            answer: items[position].answer.clone(),
            source: items[position]
                .source
                .clone()
                .or_else(|| Some("staging".to_string())),
            confidence: items[position].confidence,
            learned_at: Some(items[position].submitted_at),
        };
        engine.append_entry(entry)?;

        items[position].status = StagingStatus::Approved;
        items[position].decided_at = Some(Utc::now());
        self.save(&items)?;
        info!("approved staging item {id}");
        Ok(items[position].clone())
    }

    /// Reject a pending item, recording the reason (default `"manual"`).
    pub fn reject(&self, id: &str, reason: Option<&str>) -> CoreResult<StagingItem> {
        let mut items = self.load()?;
        let position = find_pending(&items, id)?;

        items[position].status = StagingStatus::Rejected;
        items[position].decided_at = Some(Utc::now());
        items[position].rejection_reason =
            Some(reason.unwrap_or("manual").to_string());
        self.save(&items)?;
        info!("rejected staging item {id}");
        Ok(items[position].clone())
    }

    /// Per-status counts over the whole intake.
    pub fn counts(&self) -> CoreResult<StagingCounts> {
        let mut counts = StagingCounts::default();
        for item in self.load()? {
            match item.status {
                StagingStatus::Pending => counts.pending += 1,
                StagingStatus::Approved => counts.approved += 1,
                StagingStatus::Rejected => counts.rejected += 1,
            }
        }
        Ok(counts)
    }

    fn append_line(&self, item: &StagingItem) -> CoreResult<()> {
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
        let line = serde_json::to_string(item)?;
        writeln!(file, "{line}").map_err(|e| CoreError::io(self.path.display().to_string(), e))?;
        Ok(())
    }
}

fn find_pending(items: &[StagingItem], id: &str) -> CoreResult<usize> {
    let position = items
        .iter()
        .position(|item| item.id == id)
        .ok_or_else(|| CoreError::Validation(format!("staging item not found: {id}")))?;
    if items[position].status != StagingStatus::Pending {
        return Err(CoreError::Validation(format!(
            "staging item {id} is already {}",
            items[position].status
        )));
    }
    Ok(position)
}

/// Collapse whitespace, trim, lowercase — the signature used for pending-list
/// deduplication.
fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
