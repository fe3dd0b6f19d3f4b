mod helpers;

use chrono::{TimeZone, Utc};
use helpers::{entry, helpdesk_corpus, seeded_engine, store_path};
use lore::knowledge::{KnowledgeEntry, KnowledgeStore};

#[test]
fn entry_metadata_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);

    let full = KnowledgeEntry {
        question: "Who owns the build pipeline?".to_string(),
        answer: "The release team, reachable on the releases channel.".to_string(),
        source: Some("onboarding-notes".to_string()),
        confidence: Some(0.85),
        learned_at: Some(Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()),
    };

    let mut store = KnowledgeStore::open(&path).unwrap();
    store.append(full.clone());
    store.persist().unwrap();

    let reopened = KnowledgeStore::open(&path).unwrap();
    assert_eq!(reopened.entries(), &[full]);
}

#[test]
fn wire_format_uses_short_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);

    let mut store = KnowledgeStore::open(&path).unwrap();
    store.append(entry("short keys", "on disk"));
    store.persist().unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"q\""));
    assert!(raw.contains("\"a\""));
    assert!(!raw.contains("\"question\""));
}

#[test]
fn import_skips_entries_already_stored() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = seeded_engine(&dir, helpdesk_corpus());

    let incoming = vec![
        entry(
            "How do I reset my password?",
            "Open the account portal and choose Forgot Password.",
        ),
        entry("How do I file an expense?", "Use the finance tool before month end."),
    ];
    let summary = engine.import_entries(incoming).unwrap();

    assert_eq!(summary.added, 1);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(engine.len(), 6);
}

#[test]
fn imported_entries_are_searchable_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = seeded_engine(&dir, helpdesk_corpus());

    engine
        .import_entries(vec![entry(
            "Where are the meeting rooms?",
            "Third floor, past the kitchen.",
        )])
        .unwrap();

    let response = engine.search("meeting rooms", 3).unwrap();
    assert_eq!(response.results[0].entry.question, "Where are the meeting rooms?");
}

#[test]
fn append_entry_persists_without_an_explicit_save() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = seeded_engine(&dir, helpdesk_corpus());

    let added = engine
        .append_entry(entry("Is there a bike room?", "Yes, badge access from the garage."))
        .unwrap();
    assert!(added);

    let reopened = KnowledgeStore::open(store_path(&dir)).unwrap();
    assert_eq!(reopened.len(), 6);
}

#[test]
fn exact_duplicate_append_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = seeded_engine(&dir, helpdesk_corpus());

    let added = engine
        .append_entry(entry(
            "How do I reset my password?",
            "Open the account portal and choose Forgot Password.",
        ))
        .unwrap();

    assert!(!added);
    assert_eq!(engine.len(), 5);
}
