use anyhow::Result;

use crate::config::LoreConfig;
use crate::engine::KnowledgeEngine;
use crate::knowledge::KnowledgeStore;

/// Remove entries from the store by position.
///
/// With `--all-but-first`, cluster the corpus at the duplicate threshold and
/// remove every member after the seed of each group instead of taking an
/// explicit index list. A timestamped backup is written before anything is
/// removed.
pub fn apply(
    config: &LoreConfig,
    indices: &[usize],
    all_but_first: bool,
    threshold: Option<f64>,
) -> Result<()> {
    let store = KnowledgeStore::open(config.resolved_knowledge_path())?;
    let mut engine = KnowledgeEngine::new(store);

    let targets: Vec<usize> = if all_but_first {
        let threshold = threshold.unwrap_or(config.retrieval.duplicate_threshold);
        engine
            .list_duplicates(threshold)?
            .iter()
            .flat_map(|group| group.members.iter().skip(1).map(|m| m.index))
            .collect()
    } else {
        indices.to_vec()
    };

    if targets.is_empty() {
        println!("Nothing to remove.");
        return Ok(());
    }

    let result = engine.apply_groups(&targets)?;
    println!("Removed {} entries, kept {}.", result.removed, result.kept);
    println!("A timestamped backup was written beside the store.");

    Ok(())
}
