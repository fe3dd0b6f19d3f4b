use anyhow::Result;

use crate::config::LoreConfig;
use crate::engine::KnowledgeEngine;
use crate::knowledge::KnowledgeStore;

/// Run a retrieval query from the terminal.
pub fn search(config: &LoreConfig, query: &str, top_k: Option<usize>) -> Result<()> {
    let top_k = top_k.unwrap_or(config.retrieval.default_top_k);
    let store = KnowledgeStore::open(config.resolved_knowledge_path())?;
    let engine = KnowledgeEngine::new(store);
    if engine.is_empty() {
        println!("Knowledge store is empty. Import entries with `lore import` first.");
        return Ok(());
    }

    let response = engine.search(query, top_k)?;
    if response.results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} result(s)\n", response.results.len());
    for (i, hit) in response.results.iter().enumerate() {
        println!(
            "  {}. [{}] {} (score: {:.4})",
            i + 1,
            hit.index,
            super::preview(&hit.entry.question, 100),
            hit.score,
        );
        println!("     {}", super::preview(&hit.entry.answer, 120));
        println!();
    }

    Ok(())
}
