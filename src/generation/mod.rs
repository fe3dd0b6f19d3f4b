//! Generation-service integration: HTTP client plus streaming assembly.

pub mod client;
pub mod stream;

pub use client::{ChatMessage, GenerationClient};
pub use stream::{AssemblerState, ChunkAssembler};
