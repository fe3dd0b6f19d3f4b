use anyhow::Result;
use std::path::Path;

use crate::config::LoreConfig;
use crate::session::SessionLog;

/// Append one entry to the session log.
pub fn add(config: &LoreConfig, role: &str, text: &str) -> Result<()> {
    let mut log = SessionLog::open(config.resolved_session_path())?;
    let entry = log.add(role, text, serde_json::Map::new())?;
    println!("Logged {} ({} entries total).", entry.id, log.len());
    Ok(())
}

/// Search the session log.
pub fn query(config: &LoreConfig, needle: &str, limit: Option<usize>) -> Result<()> {
    let log = SessionLog::open(config.resolved_session_path())?;
    let limit = limit.unwrap_or(config.session.query_limit);
    let hits = log.query(needle, limit)?;

    if hits.is_empty() {
        if log.is_empty() {
            println!("Session log is empty.");
        } else {
            println!("No matching log entries.");
        }
        return Ok(());
    }

    for entry in &hits {
        println!(
            "  {}  [{}] {}",
            entry.at.format("%Y-%m-%d %H:%M"),
            entry.role,
            super::preview(&entry.text, 120),
        );
    }

    Ok(())
}

/// Trim the log to a token budget, evicting oldest entries first.
pub fn trim(config: &LoreConfig, budget: Option<usize>) -> Result<()> {
    let mut log = SessionLog::open(config.resolved_session_path())?;
    let budget = budget.unwrap_or(config.session.token_budget);
    let result = log.trim_to_token_budget(budget)?;
    println!(
        "Kept {} entries (~{} tokens), removed {}.",
        result.kept, result.token_count, result.removed,
    );
    Ok(())
}

/// Delete every log entry.
pub fn clear(config: &LoreConfig) -> Result<()> {
    let mut log = SessionLog::open(config.resolved_session_path())?;
    let count = log.len();
    log.clear()?;
    println!("Cleared {count} log entries.");
    Ok(())
}

/// Export the log as JSONL to another file.
pub fn export(config: &LoreConfig, dest: &Path) -> Result<()> {
    let log = SessionLog::open(config.resolved_session_path())?;
    log.export_archive(dest)?;
    println!("Exported {} entries to {}.", log.len(), dest.display());
    Ok(())
}
