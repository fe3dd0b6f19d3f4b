#![allow(dead_code)]

use std::path::PathBuf;

use lore::engine::KnowledgeEngine;
use lore::knowledge::{KnowledgeEntry, KnowledgeStore};

/// Path for a knowledge store inside a test directory.
pub fn store_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("knowledge.json")
}

/// Persist `entries` as a store file and open an engine over it.
pub fn seeded_engine(dir: &tempfile::TempDir, entries: Vec<KnowledgeEntry>) -> KnowledgeEngine {
    let mut store = KnowledgeStore::open(store_path(dir)).unwrap();
    store.set_entries(entries);
    store.persist().unwrap();
    KnowledgeEngine::new(store)
}

pub fn entry(question: &str, answer: &str) -> KnowledgeEntry {
    KnowledgeEntry::new(question, answer)
}

/// A small help-desk corpus with one clear near-duplicate pair (the two
/// password-reset entries) and three unrelated entries.
pub fn helpdesk_corpus() -> Vec<KnowledgeEntry> {
    vec![
        entry(
            "How do I reset my password?",
            "Open the account portal and choose Forgot Password.",
        ),
        entry(
            "How do I reset my password on mobile?",
            "Open the app, tap Profile, then choose Forgot Password.",
        ),
        entry(
            "What is the guest wifi key?",
            "The guest network key rotates monthly; ask reception for the current one.",
        ),
        entry(
            "How do I connect to the VPN?",
            "Install the tunnel client and sign in with your directory account.",
        ),
        entry(
            "The printer shows offline",
            "Power-cycle the printer and re-add it from system settings.",
        ),
    ]
}

/// Count `knowledge.backup.*` files beside the store.
pub fn backup_files(dir: &tempfile::TempDir) -> usize {
    std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with("knowledge.backup.")
        })
        .count()
}
