//! Local knowledge curation — a personal question/answer corpus with
//! retrieval, duplicate cleanup, staged intake, and grounded generation.
//!
//! Lore keeps everything in plain files under a single data directory, so
//! the corpus stays inspectable and diffable:
//!
//! | File | Format | Purpose |
//! |------|--------|---------|
//! | `knowledge.json` | JSON array | Curated question/answer entries |
//! | `staging.jsonl` | JSON lines | Submitted entries awaiting review |
//! | `session.jsonl` | JSON lines | Append-only conversation log |
//!
//! # Architecture
//!
//! - **Storage**: flat JSON files with timestamped backups written before
//!   every destructive change
//! - **Retrieval**: TF-IDF over question and answer text, cosine-scored,
//!   rebuilt in memory on every mutation
//! - **Curation**: duplicate grouping by token overlap, atomic batch
//!   removal, and a staging area gating new entries
//! - **Generation**: Ollama-compatible HTTP client with streaming NDJSON
//!   assembly and retrieval-grounded prompts
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from a TOML file with defaults
//! - [`knowledge`] — Entry types, the JSON store, and import-file loading
//! - [`retrieval`] — Tokenization and the TF-IDF index
//! - [`curation`] — Duplicate detection, removal application, and staging
//! - [`engine`] — Store plus index behind one mutation-safe facade
//! - [`session`] — Append-only session log with token-budget trimming
//! - [`generation`] — HTTP client for an Ollama-compatible service
//! - [`error`] — Shared error type for the core modules

pub mod config;
pub mod curation;
pub mod engine;
pub mod error;
pub mod generation;
pub mod knowledge;
pub mod retrieval;
pub mod session;
