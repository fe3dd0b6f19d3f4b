use anyhow::Result;

use crate::config::LoreConfig;
use crate::engine::KnowledgeEngine;
use crate::knowledge::KnowledgeStore;

/// List near-duplicate clusters in the store.
pub fn duplicates(config: &LoreConfig, threshold: Option<f64>, json: bool) -> Result<()> {
    let threshold = threshold.unwrap_or(config.retrieval.duplicate_threshold);
    let store = KnowledgeStore::open(config.resolved_knowledge_path())?;
    let engine = KnowledgeEngine::new(store);

    let groups = engine.list_duplicates(threshold)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    if groups.is_empty() {
        println!("No duplicate groups at threshold {threshold:.2}.");
        return Ok(());
    }

    println!(
        "{} duplicate group(s) at threshold {threshold:.2}\n",
        groups.len()
    );
    for (i, group) in groups.iter().enumerate() {
        println!("Group {}: {}", i + 1, super::preview(&group.key, 90));
        for member in &group.members {
            println!(
                "  [{}] {:.3}  {}",
                member.index,
                member.similarity,
                super::preview(&member.entry.question, 90),
            );
        }
        println!();
    }
    println!("Review, then remove with `lore apply --indices <list>` or `lore apply --all-but-first`.");

    Ok(())
}
