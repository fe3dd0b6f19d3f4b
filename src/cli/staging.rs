use anyhow::Result;

use crate::config::LoreConfig;
use crate::curation::staging::{StagingArea, SubmitOutcome};
use crate::engine::KnowledgeEngine;
use crate::knowledge::KnowledgeStore;

/// Submit a candidate entry to the staging intake.
pub fn submit(
    config: &LoreConfig,
    question: &str,
    answer: &str,
    source: Option<&str>,
) -> Result<()> {
    let area = StagingArea::new(config.resolved_staging_path());
    match area.submit(question, answer, source.map(str::to_string), None)? {
        SubmitOutcome::Accepted(item) => {
            println!("Staged {} for review.", item.id);
        }
        SubmitOutcome::RecentDuplicate => {
            println!("An identical submission is already staged; skipped.");
        }
    }
    Ok(())
}

/// List pending staging items.
pub fn list(config: &LoreConfig) -> Result<()> {
    let area = StagingArea::new(config.resolved_staging_path());
    let pending = area.list_pending()?;

    if pending.is_empty() {
        println!("No pending staging items.");
        return Ok(());
    }

    println!("{} pending item(s)\n", pending.len());
    for item in &pending {
        println!(
            "  {}  submitted {}",
            item.id,
            item.submitted_at.format("%Y-%m-%d %H:%M"),
        );
        println!("    Q: {}", super::preview(&item.question, 100));
        println!("    A: {}", super::preview(&item.answer, 100));
        if let Some(source) = &item.source {
            println!("    from: {source}");
        }
        println!();
    }
    println!("Approve with `lore staging approve <id>` or reject with `lore staging reject <id>`.");

    Ok(())
}

/// Approve a pending item into the knowledge store.
pub fn approve(config: &LoreConfig, id: &str) -> Result<()> {
    let store = KnowledgeStore::open(config.resolved_knowledge_path())?;
    let mut engine = KnowledgeEngine::new(store);
    let area = StagingArea::new(config.resolved_staging_path());

    let item = area.approve(&mut engine, id)?;
    println!("Approved {}.", item.id);
    println!("Store now holds {} entries.", engine.len());

    Ok(())
}

/// Reject a pending item.
pub fn reject(config: &LoreConfig, id: &str, reason: Option<&str>) -> Result<()> {
    let area = StagingArea::new(config.resolved_staging_path());
    let item = area.reject(id, reason)?;
    println!(
        "Rejected {} ({}).",
        item.id,
        item.rejection_reason.as_deref().unwrap_or("manual"),
    );

    Ok(())
}
