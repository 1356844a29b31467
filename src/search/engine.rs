//! Retrieval engine - embeds a query and maps chunk hits back to notes

use std::sync::Arc;

use super::provider::EmbeddingClient;
use super::vectordb::NoteStore;
use crate::config::RetrievalConfig;
use crate::core::identity::UserId;
use crate::core::note::{EmbeddingId, Note};
use crate::error::Result;

pub struct RetrievalEngine {
    store: Arc<NoteStore>,
    embedder: EmbeddingClient,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(store: Arc<NoteStore>, embedder: EmbeddingClient, config: RetrievalConfig) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Notes of `owner` relevant to `query`, most relevant first.
    ///
    /// A note is included only if at least one of its chunks scores strictly
    /// above the threshold; its rank is that of its best chunk.
    pub async fn find_relevant_notes(&self, query: &str, owner: &UserId) -> Result<Vec<Note>> {
        let query_vector = self.embedder.embed_one(query).await?;

        let candidates =
            self.store
                .vector_search(&query_vector, owner, self.config.candidate_limit)?;

        let embedding_ids: Vec<EmbeddingId> = candidates
            .iter()
            .filter(|m| m.score > self.config.relevance_threshold)
            .map(|m| m.embedding_id.clone())
            .collect();

        tracing::debug!(
            %owner,
            candidates = candidates.len(),
            above_threshold = embedding_ids.len(),
            threshold = self.config.relevance_threshold,
            "vector search"
        );

        self.store.fetch_notes_for_embedding_ids(&embedding_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::note::ChunkEmbedding;
    use crate::error::Error;
    use crate::search::provider::HtpProvider;
    use crate::testing::{FailingProvider, KeywordProvider};

    fn keyword_chunks(texts: &[&str]) -> Vec<ChunkEmbedding> {
        texts
            .iter()
            .map(|t| ChunkEmbedding {
                content: t.to_string(),
                vector: KeywordProvider::vector_for(t),
            })
            .collect()
    }

    fn engine(store: Arc<NoteStore>, config: RetrievalConfig) -> RetrievalEngine {
        RetrievalEngine::new(store, EmbeddingClient::new(Arc::new(KeywordProvider)), config)
    }

    #[tokio::test]
    async fn test_best_chunk_determines_rank() -> Result<()> {
        let store = Arc::new(NoteStore::open_in_memory()?);
        let alice = UserId::parse("alice").unwrap();

        // "rust compiler" matches A's first chunk exactly and A's second
        // chunk weakly; B's only chunk sits in between.
        store.insert_note_with_embeddings(
            "A",
            "",
            &alice,
            &keyword_chunks(&["rust compiler", "rust garden tomato coffee"]),
        )?;
        store.insert_note_with_embeddings(
            "B",
            "",
            &alice,
            &keyword_chunks(&["rust compiler compiler garden"]),
        )?;
        store.insert_note_with_embeddings("C", "", &alice, &keyword_chunks(&["music travel"]))?;

        let notes = engine(store, RetrievalConfig::default())
            .find_relevant_notes("rust compiler", &alice)
            .await?;
        let titles: Vec<_> = notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_threshold_is_strict() -> Result<()> {
        let store = Arc::new(NoteStore::open_in_memory()?);
        let alice = UserId::parse("alice").unwrap();
        // cos("rust", "rust garden") = 1/sqrt(2) ~ 0.707
        store.insert_note_with_embeddings("A", "", &alice, &keyword_chunks(&["rust garden"]))?;

        let at = RetrievalConfig {
            relevance_threshold: 1.0 / 2f64.sqrt(),
            ..RetrievalConfig::default()
        };
        let below = RetrievalConfig {
            relevance_threshold: 0.7,
            ..RetrievalConfig::default()
        };

        let hits = engine(store.clone(), below).find_relevant_notes("rust", &alice).await?;
        assert_eq!(hits.len(), 1);
        let hits = engine(store, at).find_relevant_notes("rust", &alice).await?;
        assert!(hits.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_candidate_limit_applies_before_threshold() -> Result<()> {
        let store = Arc::new(NoteStore::open_in_memory()?);
        let alice = UserId::parse("alice").unwrap();
        store.insert_note_with_embeddings("best", "", &alice, &keyword_chunks(&["coffee"]))?;
        store.insert_note_with_embeddings(
            "second",
            "",
            &alice,
            &keyword_chunks(&["coffee budget"]),
        )?;

        let config = RetrievalConfig {
            candidate_limit: 1,
            ..RetrievalConfig::default()
        };
        let notes = engine(store, config).find_relevant_notes("coffee", &alice).await?;
        let titles: Vec<_> = notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["best"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_other_owners_are_never_returned() -> Result<()> {
        let store = Arc::new(NoteStore::open_in_memory()?);
        let alice = UserId::parse("alice").unwrap();
        let bob = UserId::parse("bob").unwrap();
        store.insert_note_with_embeddings("bob's", "", &bob, &keyword_chunks(&["travel"]))?;

        let notes = engine(store, RetrievalConfig::default())
            .find_relevant_notes("travel", &alice)
            .await?;
        assert!(notes.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces() -> Result<()> {
        let store = Arc::new(NoteStore::open_in_memory()?);
        let engine = RetrievalEngine::new(
            store,
            EmbeddingClient::new(Arc::new(FailingProvider)),
            RetrievalConfig::default(),
        );
        let err = engine
            .find_relevant_notes("anything", &UserId::parse("alice").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmbeddingProvider(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_query_from_another_model_is_rejected() -> Result<()> {
        let store = Arc::new(NoteStore::open_in_memory()?);
        let alice = UserId::parse("alice").unwrap();
        store.insert_note_with_embeddings("A", "", &alice, &keyword_chunks(&["travel"]))?;

        let engine = RetrievalEngine::new(
            store,
            EmbeddingClient::new(Arc::new(HtpProvider::new())),
            RetrievalConfig::default(),
        );
        let err = engine.find_relevant_notes("travel", &alice).await.unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 8,
                actual: 384
            }
        ));
        Ok(())
    }
}
