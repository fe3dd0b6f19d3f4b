use anyhow::Result;

use crate::config::LoreConfig;
use crate::curation::staging::StagingArea;
use crate::engine::KnowledgeEngine;
use crate::knowledge::KnowledgeStore;
use crate::session::SessionLog;

/// Display corpus, staging, and session statistics in the terminal.
pub fn stats(config: &LoreConfig) -> Result<()> {
    let store = KnowledgeStore::open(config.resolved_knowledge_path())?;
    let engine = KnowledgeEngine::new(store);
    let stats = engine.stats();

    println!("Knowledge Statistics");
    println!("{}", "=".repeat(40));
    println!("  Store:          {}", engine.store().path().display());
    println!("  Entries:        {}", stats.entries);
    println!("  Distinct terms: {}", stats.distinct_terms);
    println!("  Store size:     {} bytes", stats.store_bytes);
    println!("  Backups:        {}", stats.backups);
    println!();

    let counts = StagingArea::new(config.resolved_staging_path()).counts()?;
    println!("Staging:");
    println!("  {:<12} {}", "pending", counts.pending);
    println!("  {:<12} {}", "approved", counts.approved);
    println!("  {:<12} {}", "rejected", counts.rejected);
    println!();

    let log = SessionLog::open(config.resolved_session_path())?;
    println!("Session log:");
    println!("  {:<12} {}", "entries", log.len());
    if let Some(last) = log.all().last() {
        println!("  {:<12} {}", "last entry", last.at.format("%Y-%m-%d %H:%M"));
    }

    Ok(())
}
