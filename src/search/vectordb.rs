//! Note store on SQLite
//!
//! Notes and their chunk embeddings live in two tables. Vectors are stored
//! as little-endian f64 BLOBs and similarity is computed in Rust over the
//! requesting owner's rows only.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::embedding::cosine_similarity;
use crate::core::identity::UserId;
use crate::core::note::{ChunkEmbedding, EmbeddingId, EmbeddingRecord, Note, NoteId};
use crate::error::{Error, Result};

const NOTE_COLUMNS: &str = "id, title, body, owner_id, created_at, updated_at";
const RECORD_COLUMNS: &str = "id, note_id, owner_id, chunk_index, content, vector";

const META_EMBEDDING_MODEL: &str = "embedding_model";
const META_EMBEDDING_DIM: &str = "embedding_dim";

/// Persistent store for notes and their chunk-level embeddings.
pub struct NoteStore {
    conn: Mutex<Connection>,
}

/// One nearest-neighbor candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub embedding_id: EmbeddingId,
    pub note_id: NoteId,
    pub owner_id: UserId,
    pub score: f64,
}

/// A note as written, with its chunk record ids in chunk order.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedNote {
    pub note: Note,
    pub embedding_ids: Vec<EmbeddingId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub note_count: usize,
    pub embedding_count: usize,
}

impl NoteStore {
    /// Open or create the database at `db_path`, creating parent directories.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- No ON DELETE CASCADE: children are removed explicitly first,
            -- and the foreign key rejects any other order.
            CREATE TABLE IF NOT EXISTS note_embeddings (
                id TEXT PRIMARY KEY,
                note_id TEXT NOT NULL REFERENCES notes(id),
                owner_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                vector BLOB NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notes_owner ON notes(owner_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_embeddings_note ON note_embeddings(note_id);
            CREATE INDEX IF NOT EXISTS idx_embeddings_owner ON note_embeddings(owner_id);

            -- Which model and dimension every stored vector comes from.
            CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        // Databases written before dimensions were recorded.
        if stored_dimension(&conn)?.is_none() {
            let first: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT vector FROM note_embeddings ORDER BY rowid LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(blob) = first {
                set_meta(&conn, META_EMBEDDING_DIM, &(blob.len() / 8).to_string())?;
            }
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Writes run in transactions that roll back on drop.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The embedding model this store's vectors were produced by, if any.
    pub fn embedding_model(&self) -> Result<Option<String>> {
        get_meta(&self.conn(), META_EMBEDDING_MODEL)
    }

    /// Record `model` as the store's embedding model on first use and
    /// reject any other model afterwards.
    pub fn bind_embedding_model(&self, model: &str) -> Result<()> {
        let conn = self.conn();
        match get_meta(&conn, META_EMBEDDING_MODEL)? {
            None => {
                set_meta(&conn, META_EMBEDDING_MODEL, model)?;
                tracing::info!(model, "bound store to embedding model");
                Ok(())
            }
            Some(stored) if stored == model => Ok(()),
            Some(stored) => Err(Error::ModelMismatch {
                stored,
                requested: model.to_string(),
            }),
        }
    }

    /// Dimension of the stored vectors, fixed by the first insert.
    pub fn embedding_dimension(&self) -> Result<Option<usize>> {
        stored_dimension(&self.conn())
    }

    /// Insert a note without any embeddings.
    pub fn insert_note(&self, title: &str, body: &str, owner: &UserId) -> Result<NoteId> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let note = insert_note_row(&tx, title, body, owner)?;
        tx.commit()?;
        Ok(note.id)
    }

    /// Bulk insert one record per chunk. Identical chunk texts are kept.
    ///
    /// `owner` must own the note so the denormalized owner stays consistent.
    pub fn insert_embedding_records(
        &self,
        note_id: &NoteId,
        owner: &UserId,
        chunks: &[ChunkEmbedding],
    ) -> Result<Vec<EmbeddingId>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        ensure_owner(&tx, note_id, owner)?;
        let ids = insert_chunk_rows(&tx, note_id, owner, chunks)?;
        tx.commit()?;
        Ok(ids)
    }

    /// Insert a note and all of its chunk records in one transaction.
    pub fn insert_note_with_embeddings(
        &self,
        title: &str,
        body: &str,
        owner: &UserId,
        chunks: &[ChunkEmbedding],
    ) -> Result<SavedNote> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let note = insert_note_row(&tx, title, body, owner)?;
        let embedding_ids = insert_chunk_rows(&tx, &note.id, owner, chunks)?;
        tx.commit()?;

        tracing::info!(note_id = %note.id, chunks = embedding_ids.len(), "inserted note");
        Ok(SavedNote {
            note,
            embedding_ids,
        })
    }

    /// Notes owned by `owner`, newest first. No owner means no notes.
    pub fn get_notes_by_owner(&self, owner: Option<&UserId>) -> Result<Vec<Note>> {
        let Some(owner) = owner else {
            return Ok(Vec::new());
        };

        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE owner_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let notes = stmt
            .query_map(params![owner.as_str()], note_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    pub fn get_note(&self, note_id: &NoteId) -> Result<Option<Note>> {
        get_note_row(&self.conn(), note_id)
    }

    /// All records of a note, in chunk order.
    pub fn get_embedding_records_by_note(&self, note_id: &NoteId) -> Result<Vec<EmbeddingRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM note_embeddings WHERE note_id = ?1
             ORDER BY chunk_index"
        ))?;
        let records = stmt
            .query_map(params![note_id.as_str()], record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn get_embedding_record(&self, id: &EmbeddingId) -> Result<Option<EmbeddingRecord>> {
        let record = self
            .conn()
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM note_embeddings WHERE id = ?1"),
                params![id.as_str()],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Replace title, body and the whole chunk record set of a note.
    ///
    /// Old records are deleted in the same transaction that inserts the new
    /// ones, so no reader ever sees a mix of both versions.
    pub fn replace_note_content(
        &self,
        note_id: &NoteId,
        caller: &UserId,
        title: &str,
        body: &str,
        chunks: &[ChunkEmbedding],
    ) -> Result<SavedNote> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        ensure_owner(&tx, note_id, caller)?;

        tx.execute(
            "UPDATE notes SET title = ?2, body = ?3, updated_at = ?4 WHERE id = ?1",
            params![note_id.as_str(), title, body, now_millis()],
        )?;
        let purged = tx.execute(
            "DELETE FROM note_embeddings WHERE note_id = ?1",
            params![note_id.as_str()],
        )?;
        let embedding_ids = insert_chunk_rows(&tx, note_id, caller, chunks)?;

        let note = get_note_row(&tx, note_id)?.ok_or_else(|| Error::NotFound {
            note_id: note_id.clone(),
        })?;
        tx.commit()?;

        tracing::info!(
            %note_id,
            purged,
            inserted = embedding_ids.len(),
            "replaced note content"
        );
        Ok(SavedNote {
            note,
            embedding_ids,
        })
    }

    /// Delete a note and every record referencing it, children first.
    pub fn delete_note(&self, note_id: &NoteId, caller: Option<&UserId>) -> Result<()> {
        let caller = caller.ok_or(Error::NotAuthenticated)?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        ensure_owner(&tx, note_id, caller)?;

        let removed = tx.execute(
            "DELETE FROM note_embeddings WHERE note_id = ?1",
            params![note_id.as_str()],
        )?;
        tx.execute("DELETE FROM notes WHERE id = ?1", params![note_id.as_str()])?;
        tx.commit()?;

        tracing::info!(%note_id, embeddings = removed, "deleted note");
        Ok(())
    }

    /// Resolve embedding ids to their distinct parent notes.
    ///
    /// Output order is the first-occurrence order of each note among `ids`,
    /// so a caller passing ids in rank order gets notes in rank order.
    pub fn fetch_notes_for_embedding_ids(&self, ids: &[EmbeddingId]) -> Result<Vec<Note>> {
        let conn = self.conn();

        let mut seen: HashSet<NoteId> = HashSet::with_capacity(ids.len());
        let mut note_ids: Vec<NoteId> = Vec::with_capacity(ids.len());
        for id in ids {
            let parent: Option<String> = conn
                .query_row(
                    "SELECT note_id FROM note_embeddings WHERE id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(parent) = parent else {
                tracing::debug!(embedding_id = %id, "embedding no longer exists, skipping");
                continue;
            };
            let parent = NoteId::from(parent);
            if seen.insert(parent.clone()) {
                note_ids.push(parent);
            }
        }

        let mut notes = Vec::with_capacity(note_ids.len());
        for note_id in &note_ids {
            match get_note_row(&conn, note_id)? {
                Some(note) => notes.push(note),
                None => tracing::warn!(%note_id, "embedding references a missing note"),
            }
        }
        Ok(notes)
    }

    /// Nearest neighbors of `query` among `owner`'s chunk vectors, best first.
    ///
    /// Ties keep insertion order. Scores are cosine similarities in [-1, 1].
    /// A query whose dimension differs from the stored vectors is rejected.
    pub fn vector_search(
        &self,
        query: &[f64],
        owner: &UserId,
        limit: usize,
    ) -> Result<Vec<VectorMatch>> {
        // Brute force over the owner's rows; fine for a personal corpus.
        let conn = self.conn();
        match stored_dimension(&conn)? {
            Some(expected) if expected != query.len() => {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
            Some(_) => {}
            // Nothing has been embedded yet.
            None => return Ok(Vec::new()),
        }

        let mut stmt = conn.prepare(
            "SELECT id, note_id, owner_id, vector FROM note_embeddings
             WHERE owner_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![owner.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })?;

        let mut matches = Vec::new();
        for row in rows {
            let (id, note_id, owner_id, blob) = row?;
            matches.push(VectorMatch {
                embedding_id: EmbeddingId::from(id),
                note_id: NoteId::from(note_id),
                owner_id: UserId::from_stored(owner_id),
                score: cosine_similarity(query, &blob_to_vector(&blob)),
            });
        }

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(limit);
        Ok(matches)
    }

    /// Note and record counts for `owner`. No owner means nothing to count.
    pub fn stats(&self, owner: Option<&UserId>) -> Result<StoreStats> {
        let Some(owner) = owner else {
            return Ok(StoreStats::default());
        };

        let conn = self.conn();
        let note_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE owner_id = ?1",
            params![owner.as_str()],
            |row| row.get(0),
        )?;
        let embedding_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM note_embeddings WHERE owner_id = ?1",
            params![owner.as_str()],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            note_count: note_count as usize,
            embedding_count: embedding_count as usize,
        })
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn insert_note_row(conn: &Connection, title: &str, body: &str, owner: &UserId) -> Result<Note> {
    let now = now_millis();
    let note = Note {
        id: NoteId::generate(),
        title: title.to_string(),
        body: body.to_string(),
        owner_id: owner.clone(),
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        &format!("INSERT INTO notes ({NOTE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
        params![
            note.id.as_str(),
            note.title,
            note.body,
            note.owner_id.as_str(),
            note.created_at,
            note.updated_at,
        ],
    )?;
    Ok(note)
}

fn insert_chunk_rows(
    conn: &Connection,
    note_id: &NoteId,
    owner: &UserId,
    chunks: &[ChunkEmbedding],
) -> Result<Vec<EmbeddingId>> {
    check_dimensions(conn, chunks)?;

    let mut stmt = conn.prepare(&format!(
        "INSERT INTO note_embeddings ({RECORD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    ))?;

    let mut ids = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        let id = EmbeddingId::generate();
        stmt.execute(params![
            id.as_str(),
            note_id.as_str(),
            owner.as_str(),
            index as i64,
            chunk.content,
            vector_to_blob(&chunk.vector),
        ])?;
        ids.push(id);
    }
    Ok(ids)
}

/// Every vector must match the store's dimension. The first vector ever
/// inserted fixes it.
fn check_dimensions(conn: &Connection, chunks: &[ChunkEmbedding]) -> Result<()> {
    let Some(first) = chunks.first() else {
        return Ok(());
    };
    let stored = stored_dimension(conn)?;
    let expected = stored.unwrap_or(first.vector.len());

    if let Some(bad) = chunks.iter().find(|c| c.vector.len() != expected) {
        return Err(Error::DimensionMismatch {
            expected,
            actual: bad.vector.len(),
        });
    }
    if stored.is_none() {
        // Inside the caller's transaction, so a rolled-back insert unsets it.
        set_meta(conn, META_EMBEDDING_DIM, &expected.to_string())?;
    }
    Ok(())
}

fn stored_dimension(conn: &Connection) -> Result<Option<usize>> {
    let dim: Option<i64> = conn
        .query_row(
            "SELECT CAST(value AS INTEGER) FROM store_meta WHERE key = ?1",
            params![META_EMBEDDING_DIM],
            |row| row.get(0),
        )
        .optional()?;
    Ok(dim.map(|d| d as usize))
}

fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO store_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

fn get_note_row(conn: &Connection, note_id: &NoteId) -> Result<Option<Note>> {
    let note = conn
        .query_row(
            &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1"),
            params![note_id.as_str()],
            note_from_row,
        )
        .optional()?;
    Ok(note)
}

/// Fails with `NotFound` or `NotAuthorized` unless `caller` owns the note.
fn ensure_owner(conn: &Connection, note_id: &NoteId, caller: &UserId) -> Result<()> {
    let owner: Option<String> = conn
        .query_row(
            "SELECT owner_id FROM notes WHERE id = ?1",
            params![note_id.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    match owner {
        None => Err(Error::NotFound {
            note_id: note_id.clone(),
        }),
        Some(owner) if owner != caller.as_str() => Err(Error::NotAuthorized {
            note_id: note_id.clone(),
        }),
        Some(_) => Ok(()),
    }
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: NoteId::from(row.get::<_, String>(0)?),
        title: row.get(1)?,
        body: row.get(2)?,
        owner_id: UserId::from_stored(row.get(3)?),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<EmbeddingRecord> {
    let blob: Vec<u8> = row.get(5)?;
    Ok(EmbeddingRecord {
        id: EmbeddingId::from(row.get::<_, String>(0)?),
        note_id: NoteId::from(row.get::<_, String>(1)?),
        owner_id: UserId::from_stored(row.get(2)?),
        chunk_index: row.get::<_, i64>(3)? as usize,
        content: row.get(4)?,
        vector: blob_to_vector(&blob),
    })
}

fn vector_to_blob(vector: &[f64]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn blob_to_vector(blob: &[u8]) -> Vec<f64> {
    blob.chunks_exact(8)
        .map(|bytes| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bytes);
            f64::from_le_bytes(buf)
        })
        .collect()
}
