//! Note lifecycle: every write re-derives chunk embeddings from the note text.
//!
//! Embedding always completes before the store is touched.

use std::sync::Arc;

use crate::config::{Config, RetrievalConfig};
use crate::core::chunk::chunk;
use crate::core::identity::UserId;
use crate::core::note::{compose_note_text, ChunkEmbedding, Note, NoteId};
use crate::error::{Error, Result};
use crate::search::engine::RetrievalEngine;
use crate::search::provider::{EmbeddingClient, EmbeddingProvider};
use crate::search::vectordb::{NoteStore, SavedNote, StoreStats};

pub struct NoteService {
    store: Arc<NoteStore>,
    embedder: EmbeddingClient,
    engine: RetrievalEngine,
}

impl NoteService {
    pub fn new(
        store: NoteStore,
        provider: Arc<dyn EmbeddingProvider>,
        retrieval: RetrievalConfig,
    ) -> Self {
        let store = Arc::new(store);
        let embedder = EmbeddingClient::new(provider);
        let engine = RetrievalEngine::new(store.clone(), embedder.clone(), retrieval);

        Self {
            store,
            embedder,
            engine,
        }
    }

    /// Open the configured database and wire it to `provider`.
    ///
    /// Fails with `ModelMismatch` when the database already holds vectors
    /// from a different model.
    pub fn open(config: &Config, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        config.validate()?;
        let store = NoteStore::open(&config.db_path)?;
        if let Some(stored) = store.embedding_model()? {
            if stored != provider.model_name() {
                return Err(Error::ModelMismatch {
                    stored,
                    requested: provider.model_name().to_string(),
                });
            }
        }
        Ok(Self::new(store, provider, config.retrieval))
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    pub async fn create_note(
        &self,
        caller: Option<&UserId>,
        title: &str,
        body: &str,
    ) -> Result<SavedNote> {
        let caller = caller.ok_or(Error::NotAuthenticated)?;

        let chunks = self.embed_note_text(title, body).await?;
        self.store
            .insert_note_with_embeddings(title, body, caller, &chunks)
    }

    /// Full replace of title and body. The note's chunk records are rebuilt
    /// from the new text; none of the old ones survive.
    pub async fn update_note(
        &self,
        caller: Option<&UserId>,
        note_id: &NoteId,
        title: &str,
        body: &str,
    ) -> Result<SavedNote> {
        let caller = caller.ok_or(Error::NotAuthenticated)?;

        // Fail fast before paying for embeddings; the store re-checks
        // ownership inside the write transaction.
        self.owned_note(caller, note_id)?;

        let chunks = self.embed_note_text(title, body).await?;
        self.store
            .replace_note_content(note_id, caller, title, body, &chunks)
    }

    pub fn delete_note(&self, caller: Option<&UserId>, note_id: &NoteId) -> Result<()> {
        self.store.delete_note(note_id, caller)
    }

    /// The caller's notes, newest first; anonymous callers simply have none.
    pub fn list_notes(&self, caller: Option<&UserId>) -> Result<Vec<Note>> {
        self.store.get_notes_by_owner(caller)
    }

    pub fn get_note(&self, caller: Option<&UserId>, note_id: &NoteId) -> Result<Note> {
        let caller = caller.ok_or(Error::NotAuthenticated)?;
        self.owned_note(caller, note_id)
    }

    pub async fn find_relevant_notes(&self, query: &str, owner: &UserId) -> Result<Vec<Note>> {
        self.engine.find_relevant_notes(query, owner).await
    }

    /// Counts over the caller's own notes.
    pub fn stats(&self, caller: Option<&UserId>) -> Result<StoreStats> {
        self.store.stats(caller)
    }

    async fn embed_note_text(&self, title: &str, body: &str) -> Result<Vec<ChunkEmbedding>> {
        let chunks = chunk(&compose_note_text(title, body));
        let embedded = self.embedder.embed_chunks(chunks).await?;
        if !embedded.is_empty() {
            self.store.bind_embedding_model(self.model_name())?;
        }
        Ok(embedded)
    }

    fn owned_note(&self, caller: &UserId, note_id: &NoteId) -> Result<Note> {
        let note = self.store.get_note(note_id)?.ok_or_else(|| Error::NotFound {
            note_id: note_id.clone(),
        })?;
        if &note.owner_id != caller {
            return Err(Error::NotAuthorized {
                note_id: note_id.clone(),
            });
        }
        Ok(note)
    }
}
