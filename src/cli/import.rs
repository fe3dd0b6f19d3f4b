use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use crate::config::LoreConfig;
use crate::engine::KnowledgeEngine;
use crate::knowledge::{load_sources, KnowledgeStore};

/// Import entries from JSON files into the knowledge store.
///
/// Accepts every recognized entry shape (short keys, long keys,
/// input/output pairs). Exact duplicates against the store and within the
/// batch are skipped; unreadable files are reported and skipped.
pub fn import(config: &LoreConfig, files: &[PathBuf]) -> Result<()> {
    anyhow::ensure!(!files.is_empty(), "no import files given");

    let store = KnowledgeStore::open(config.resolved_knowledge_path())?;
    let mut engine = KnowledgeEngine::new(store);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} files")
            .expect("valid template")
            .progress_chars("##-"),
    );

    let mut added = 0usize;
    let mut duplicates = 0usize;
    let mut unrecognized = 0usize;
    let mut files_failed = 0usize;
    for file in files {
        let outcome = load_sources(std::slice::from_ref(file));
        unrecognized += outcome.skipped_items;
        files_failed += outcome.files_skipped;
        let summary = engine.import_entries(outcome.entries)?;
        added += summary.added;
        duplicates += summary.duplicates;
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!("Import complete:");
    println!("  Entries added:      {added}");
    println!("  Duplicates skipped: {duplicates}");
    if unrecognized > 0 {
        println!("  Unrecognized items: {unrecognized}");
    }
    if files_failed > 0 {
        println!("  Unreadable files:   {files_failed}");
    }
    println!("  Store now holds {} entries.", engine.len());

    Ok(())
}
