pub mod loader;
pub mod store;
pub mod types;

pub use loader::{load_sources, LoadOutcome};
pub use store::KnowledgeStore;
pub use types::{KnowledgeEntry, RawEntry};
