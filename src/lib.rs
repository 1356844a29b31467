//! notevec library
//!
//! Personal notes embedded chunk by chunk and retrieved by semantic
//! similarity, scoped to the owning user.
//!
//! # Modules
//!
//! - `core`: notes, chunking and caller identity
//! - `search`: embedding providers, the note store and retrieval
//! - `service`: create/update/delete orchestration over store and provider

pub mod config;
pub mod core;
pub mod error;
pub mod search;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use crate::config::{Config, EmbeddingConfig, RetrievalConfig};
pub use crate::core::chunk::{chunk, chunk_iter};
pub use crate::core::identity::{resolve_caller_identity, RequestContext, UserId};
pub use crate::core::note::{
    compose_note_text, ChunkEmbedding, EmbeddingId, EmbeddingRecord, Note, NoteId,
};
pub use crate::error::{EmbeddingError, Error, ErrorKind, Result};
pub use crate::service::NoteService;
