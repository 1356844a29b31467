//! Runtime configuration.
//!
//! Defaults match the hosted deployment; every value can be overridden from
//! `NOTEVEC_*` environment variables and then from CLI flags.

use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.3;
pub const DEFAULT_CANDIDATE_LIMIT: usize = 16;
pub const DEFAULT_EMBEDDING_API_BASE: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_EMBEDDING_MODEL: &str = "gemini-embedding-001";
pub const DEFAULT_EMBEDDING_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database holding notes and chunk vectors.
    pub db_path: PathBuf,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible base URL; `/embeddings` is appended.
    pub api_base: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Requested output dimensionality, if the provider supports truncation.
    pub dimensions: Option<u32>,
    pub timeout_ms: u64,
}

/// Policy knobs for `find_relevant_notes`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalConfig {
    /// Candidates must score strictly above this.
    pub relevance_threshold: f64,
    /// Nearest-neighbor candidates fetched before thresholding.
    pub candidate_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(".notevec/notes.db"),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_EMBEDDING_API_BASE.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key: None,
            dimensions: None,
            timeout_ms: DEFAULT_EMBEDDING_TIMEOUT_MS,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }
}

impl Config {
    /// Load from the process environment and validate.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(path) = get("NOTEVEC_DB_PATH") {
            cfg.db_path = PathBuf::from(path);
        }
        if let Some(base) = get("NOTEVEC_EMBEDDING_API_BASE") {
            cfg.embedding.api_base = base;
        }
        if let Some(model) = get("NOTEVEC_EMBEDDING_MODEL") {
            cfg.embedding.model = model;
        }
        cfg.embedding.api_key = get("NOTEVEC_EMBEDDING_API_KEY").or_else(|| get("GEMINI_API_KEY"));
        if let Some(raw) = get("NOTEVEC_EMBEDDING_DIMENSIONS") {
            cfg.embedding.dimensions = Some(parse_value("NOTEVEC_EMBEDDING_DIMENSIONS", &raw)?);
        }
        if let Some(raw) = get("NOTEVEC_EMBEDDING_TIMEOUT_MS") {
            cfg.embedding.timeout_ms = parse_value("NOTEVEC_EMBEDDING_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = get("NOTEVEC_RELEVANCE_THRESHOLD") {
            cfg.retrieval.relevance_threshold = parse_value("NOTEVEC_RELEVANCE_THRESHOLD", &raw)?;
        }
        if let Some(raw) = get("NOTEVEC_CANDIDATE_LIMIT") {
            cfg.retrieval.candidate_limit = parse_value("NOTEVEC_CANDIDATE_LIMIT", &raw)?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.retrieval.validate()?;

        if self.embedding.model.trim().is_empty() {
            return Err(Error::Config("embedding model must be non-empty".to_string()));
        }
        if self.embedding.timeout_ms == 0 {
            return Err(Error::Config(
                "embedding timeout must be greater than zero".to_string(),
            ));
        }
        if self.embedding.dimensions == Some(0) {
            return Err(Error::Config(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<()> {
        let t = self.relevance_threshold;
        if !t.is_finite() || !(-1.0..=1.0).contains(&t) {
            return Err(Error::Config(format!(
                "relevance threshold must be within [-1, 1], got {t}"
            )));
        }
        if self.candidate_limit == 0 {
            return Err(Error::Config(
                "candidate limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("{key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let cfg = Config::from_lookup(lookup(&[]))?;
        assert_eq!(cfg.retrieval.relevance_threshold, 0.3);
        assert_eq!(cfg.retrieval.candidate_limit, 16);
        assert_eq!(cfg.embedding.model, "gemini-embedding-001");
        assert!(cfg.embedding.api_key.is_none());
        Ok(())
    }

    #[test]
    fn test_env_overrides() -> Result<()> {
        let cfg = Config::from_lookup(lookup(&[
            ("NOTEVEC_DB_PATH", "/tmp/n.db"),
            ("NOTEVEC_RELEVANCE_THRESHOLD", "0.5"),
            ("NOTEVEC_CANDIDATE_LIMIT", "4"),
            ("NOTEVEC_EMBEDDING_DIMENSIONS", "768"),
            ("GEMINI_API_KEY", "secret"),
        ]))?;
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/n.db"));
        assert_eq!(cfg.retrieval.relevance_threshold, 0.5);
        assert_eq!(cfg.retrieval.candidate_limit, 4);
        assert_eq!(cfg.embedding.dimensions, Some(768));
        assert_eq!(cfg.embedding.api_key.as_deref(), Some("secret"));
        Ok(())
    }

    #[test]
    fn test_explicit_key_wins_over_gemini_key() -> Result<()> {
        let cfg = Config::from_lookup(lookup(&[
            ("NOTEVEC_EMBEDDING_API_KEY", "primary"),
            ("GEMINI_API_KEY", "fallback"),
        ]))?;
        assert_eq!(cfg.embedding.api_key.as_deref(), Some("primary"));
        Ok(())
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = Config::from_lookup(lookup(&[("NOTEVEC_CANDIDATE_LIMIT", "0")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err =
            Config::from_lookup(lookup(&[("NOTEVEC_RELEVANCE_THRESHOLD", "1.5")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err =
            Config::from_lookup(lookup(&[("NOTEVEC_RELEVANCE_THRESHOLD", "high")])).unwrap_err();
        assert!(err.to_string().contains("NOTEVEC_RELEVANCE_THRESHOLD"));
    }
}
