//! Deterministic providers for unit tests.

use async_trait::async_trait;

use crate::error::EmbeddingError;
use crate::search::provider::EmbeddingProvider;

const VOCAB: [&str; 8] = [
    "rust", "compiler", "garden", "tomato", "coffee", "travel", "budget", "music",
];

/// One axis per vocabulary word, valued by occurrence count. Text with no
/// vocabulary word maps to the zero vector and scores 0 against everything.
pub struct KeywordProvider;

impl KeywordProvider {
    pub fn vector_for(text: &str) -> Vec<f64> {
        let mut v = vec![0.0; VOCAB.len()];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
        {
            if let Some(i) = VOCAB.iter().position(|w| *w == token) {
                v[i] += 1.0;
            }
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordProvider {
    async fn embed_one(&self, text: &str) -> Result<Vec<f64>, EmbeddingError> {
        Ok(Self::vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}

pub struct FailingProvider;

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    async fn embed_one(&self, _text: &str) -> Result<Vec<f64>, EmbeddingError> {
        Err(EmbeddingError::InvalidResponse {
            message: "provider unavailable".to_string(),
        })
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        Err(EmbeddingError::InvalidResponse {
            message: "provider unavailable".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "failing-test"
    }
}

/// Always answers with a single vector, whatever the batch size.
pub struct MiscountProvider;

#[async_trait]
impl EmbeddingProvider for MiscountProvider {
    async fn embed_one(&self, _text: &str) -> Result<Vec<f64>, EmbeddingError> {
        Ok(vec![1.0])
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        Ok(vec![vec![1.0]])
    }

    fn model_name(&self) -> &str {
        "miscount-test"
    }
}

/// Well-formed except for the last vector of every response, which holds a NaN.
pub struct NanProvider;

#[async_trait]
impl EmbeddingProvider for NanProvider {
    async fn embed_one(&self, _text: &str) -> Result<Vec<f64>, EmbeddingError> {
        Ok(vec![f64::NAN, 1.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        let mut vectors = vec![vec![1.0, 0.0]; texts.len()];
        if let Some(last) = vectors.last_mut() {
            last[0] = f64::NAN;
        }
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        "nan-test"
    }
}

/// Returns zero-length vectors.
pub struct EmptyVectorProvider;

#[async_trait]
impl EmbeddingProvider for EmptyVectorProvider {
    async fn embed_one(&self, _text: &str) -> Result<Vec<f64>, EmbeddingError> {
        Ok(Vec::new())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        Ok(vec![Vec::new(); texts.len()])
    }

    fn model_name(&self) -> &str {
        "empty-test"
    }
}
