//! Chunk embeddings and semantic retrieval
//!
//! - `embedding`: local HTP model and cosine similarity
//! - `provider`: embedding providers and the contract-checking client
//! - `vectordb`: SQLite note store with owner-scoped vector search
//! - `engine`: threshold-filtered retrieval deduplicated to notes

pub mod embedding;
pub mod engine;
pub mod provider;
pub mod vectordb;

pub use embedding::{cosine_similarity, HtpModel};
pub use engine::RetrievalEngine;
pub use provider::{EmbeddingClient, EmbeddingProvider, HtpProvider, OpenAiCompatProvider};
pub use vectordb::{NoteStore, SavedNote, StoreStats, VectorMatch};
