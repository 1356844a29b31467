//! Error taxonomy shared by the store, the retrieval engine and the service.

use crate::core::note::NoteId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("User must be authenticated to perform this action")]
    NotAuthenticated,
    #[error("Note not found: {note_id}")]
    NotFound { note_id: NoteId },
    #[error("User is not authorized to access note {note_id}")]
    NotAuthorized { note_id: NoteId },
    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(#[from] EmbeddingError),
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Store was embedded with model {stored}, not {requested}")]
    ModelMismatch { stored: String, requested: String },
    #[error("Vector has {actual} dimensions but the store holds {expected}-dimensional vectors")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Coarse discriminant for mapping errors onto user-facing responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotAuthenticated,
    NotFound,
    NotAuthorized,
    EmbeddingProvider,
    Storage,
    Config,
    /// Vectors from different embedding models would be compared.
    IncompatibleEmbeddings,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthenticated => ErrorKind::NotAuthenticated,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            Self::EmbeddingProvider(_) => ErrorKind::EmbeddingProvider,
            Self::Storage(_) | Self::Io(_) => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
            Self::ModelMismatch { .. } | Self::DimensionMismatch { .. } => {
                ErrorKind::IncompatibleEmbeddings
            }
        }
    }
}

/// Failures raised at the embedding provider boundary.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("Invalid embedding response: {message}")]
    InvalidResponse { message: String },
    #[error("Provider returned {actual} embeddings for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
    #[error("Embedding at index {index} is empty or not finite")]
    InvalidVector { index: usize },
}
