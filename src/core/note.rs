use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::UserId;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a stored note.
    NoteId
);

string_id!(
    /// Identifier of a single chunk embedding row.
    EmbeddingId
);

/// A user's note. Title and body only ever change through a full replace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub body: String,
    pub owner_id: UserId,
    /// Unix milliseconds
    pub created_at: i64,
    /// Unix milliseconds
    pub updated_at: i64,
}

/// One embedded chunk of a note.
///
/// `owner_id` is a denormalized copy of the parent note's owner so vector
/// search can be scoped without joining back to `notes`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub id: EmbeddingId,
    pub note_id: NoteId,
    pub owner_id: UserId,
    pub chunk_index: usize,
    pub content: String,
    pub vector: Vec<f64>,
}

/// Chunk text paired with its vector, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkEmbedding {
    pub content: String,
    pub vector: Vec<f64>,
}

/// Text that gets chunked and embedded for a note: title, blank line, body.
pub fn compose_note_text(title: &str, body: &str) -> String {
    format!("{title}\n\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_note_text() {
        assert_eq!(compose_note_text("T", "B"), "T\n\nB");
        assert_eq!(compose_note_text("", ""), "\n\n");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = NoteId::generate();
        let b = NoteId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = EmbeddingId::from("e1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"e1\"");
    }
}
