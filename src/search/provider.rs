//! Embedding providers and the client that guards their contract.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::embedding::HtpModel;
use crate::config::EmbeddingConfig;
use crate::core::note::ChunkEmbedding;
use crate::error::EmbeddingError;

/// A remote or local model that turns text into vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_one(&self, text: &str) -> Result<Vec<f64>, EmbeddingError>;

    /// Must return one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError>;

    fn model_name(&self) -> &str;
}

/// Shared handle over a provider that enforces count and shape
/// postconditions. Failures are returned as-is; nothing is retried.
#[derive(Clone)]
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingClient {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub async fn embed_one(&self, text: &str) -> Result<Vec<f64>, EmbeddingError> {
        let vector = self.provider.embed_one(text).await?;
        check_vector(0, &vector)?;
        Ok(vector)
    }

    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self.provider.embed_batch(texts).await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }
        for (index, vector) in vectors.iter().enumerate() {
            check_vector(index, vector)?;
        }

        tracing::debug!(
            model = self.provider.model_name(),
            count = vectors.len(),
            "embedded batch"
        );
        Ok(vectors)
    }

    /// Embed `chunks` in one batched call and pair each chunk with its vector.
    pub async fn embed_chunks(
        &self,
        chunks: Vec<String>,
    ) -> Result<Vec<ChunkEmbedding>, EmbeddingError> {
        let vectors = self.embed_batch(&chunks).await?;
        Ok(chunks
            .into_iter()
            .zip(vectors)
            .map(|(content, vector)| ChunkEmbedding { content, vector })
            .collect())
    }
}

fn check_vector(index: usize, vector: &[f64]) -> Result<(), EmbeddingError> {
    if vector.is_empty() || vector.iter().any(|x| !x.is_finite()) {
        return Err(EmbeddingError::InvalidVector { index });
    }
    Ok(())
}

/// Provider speaking the OpenAI `/embeddings` wire format.
///
/// Gemini, OpenAI and most self-hosted servers accept it.
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dimensions: Option<u32>,
}

impl OpenAiCompatProvider {
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            endpoint: embeddings_endpoint(&cfg.api_base),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            dimensions: cfg.dimensions,
        })
    }
}

fn embeddings_endpoint(api_base: &str) -> String {
    let base = api_base.trim_end_matches('/');
    if base.ends_with("/embeddings") {
        base.to_string()
    } else {
        format!("{base}/embeddings")
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f64>,
}

/// Order vectors by their reported `index`, falling back to position.
///
/// The indices must cover `0..n` exactly once each.
fn into_ordered_vectors(resp: EmbeddingResponse) -> Result<Vec<Vec<f64>>, EmbeddingError> {
    let len = resp.data.len();
    let mut slots: Vec<Option<Vec<f64>>> = vec![None; len];
    for (pos, item) in resp.data.into_iter().enumerate() {
        let index = item.index.unwrap_or(pos);
        match slots.get_mut(index) {
            Some(slot) if slot.is_none() => *slot = Some(item.embedding),
            Some(_) => {
                return Err(EmbeddingError::InvalidResponse {
                    message: format!("duplicate embedding index {index}"),
                })
            }
            None => {
                return Err(EmbeddingError::InvalidResponse {
                    message: format!("embedding index {index} out of range for {len} items"),
                })
            }
        }
    }
    // n items in n distinct in-range slots fill every slot.
    Ok(slots.into_iter().flatten().collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatProvider {
    async fn embed_one(&self, text: &str) -> Result<Vec<f64>, EmbeddingError> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse {
                message: "empty embedding response".to_string(),
            })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimensions,
        };

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let bytes = req.send().await?.error_for_status()?.bytes().await?;
        let resp: EmbeddingResponse =
            serde_json::from_slice(&bytes).map_err(|e| EmbeddingError::InvalidResponse {
                message: e.to_string(),
            })?;

        into_ordered_vectors(resp)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Offline provider backed by the deterministic HTP model.
#[derive(Debug, Default)]
pub struct HtpProvider {
    model: HtpModel,
}

impl HtpProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmbeddingProvider for HtpProvider {
    async fn embed_one(&self, text: &str) -> Result<Vec<f64>, EmbeddingError> {
        Ok(self.model.embed(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.model.embed(t)).collect())
    }

    fn model_name(&self) -> &str {
        "htp-384"
    }
}
