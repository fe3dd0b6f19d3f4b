use anyhow::Result;

use crate::config::LoreConfig;
use crate::engine::KnowledgeEngine;
use crate::knowledge::{load_sources, KnowledgeStore};

/// Rebuild the retrieval index, merging any configured extra source files
/// into the store first.
pub fn reindex(config: &LoreConfig) -> Result<()> {
    let store = KnowledgeStore::open(config.resolved_knowledge_path())?;
    let mut engine = KnowledgeEngine::new(store);

    let sources = config.resolved_source_paths();
    if !sources.is_empty() {
        let outcome = load_sources(&sources);
        println!(
            "Read {} entries from {} source file(s)",
            outcome.entries.len(),
            outcome.files_read,
        );
        if outcome.files_skipped > 0 {
            println!("  {} unreadable file(s) skipped", outcome.files_skipped);
        }
        if outcome.skipped_items > 0 {
            println!("  {} unrecognized item(s) skipped", outcome.skipped_items);
        }
        let merged = engine.import_entries(outcome.entries)?;
        if merged.added > 0 {
            println!(
                "  Merged {} new entries ({} already present)",
                merged.added, merged.duplicates,
            );
        }
    }

    let summary = engine.reindex();
    println!(
        "Indexed {} entries ({} distinct terms)",
        summary.indexed, summary.terms,
    );

    Ok(())
}
