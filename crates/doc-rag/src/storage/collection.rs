//! SQLite-backed chunk collection with brute-force cosine search
//!
//! Every chunk is stored with its embedding as a little-endian f32 blob. Search
//! scans the collection in insertion order and keeps the best `top_k` matches,
//! so equal scores come back in the order the chunks were added.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Chunk, ScoredChunk};

/// Chunks written by one `insert` call, as listed by [`ChunkCollection::manifest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Path of the uploaded document
    pub path: PathBuf,
    /// File name used as chunk source
    pub source: String,
    /// Chunk ids in insertion order
    pub vector_ids: Vec<String>,
    /// Time the batch was written
    pub stored_at: DateTime<Utc>,
}

/// Persistent named collection of embedded chunks
pub struct ChunkCollection {
    conn: Arc<Mutex<Connection>>,
    name: String,
}

impl ChunkCollection {
    /// Create or open the collection `name` in the database at `path`
    pub fn open<P: AsRef<Path>>(path: P, name: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::store(format!("Failed to open database: {}", e)))?;

        Self::with_connection(conn, name.into())
    }

    /// Create an in-memory collection (for testing)
    #[cfg(test)]
    pub fn in_memory(name: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store(format!("Failed to open in-memory database: {}", e)))?;
        Self::with_connection(conn, name.to_string())
    }

    fn with_connection(conn: Connection, name: String) -> Result<Self> {
        let collection = Self {
            conn: Arc::new(Mutex::new(conn)),
            name,
        };
        collection.migrate()?;
        Ok(collection)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            "#,
        )
        .map_err(|e| Error::store(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                collection TEXT NOT NULL,
                batch_id TEXT NOT NULL,
                content TEXT NOT NULL,
                source TEXT NOT NULL,
                path TEXT NOT NULL,
                page INTEGER NOT NULL,
                chunk_index INTEGER NOT NULL,
                dims INTEGER NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_collection ON chunks(collection, seq);
            CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(collection, source);
            "#,
        )
        .map_err(|e| Error::store(format!("Failed to create tables: {}", e)))?;

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store chunks with their embeddings in one transaction, returning the new ids
    pub fn insert(&self, entries: &[(Chunk, Vec<f32>)]) -> Result<Vec<String>> {
        let Some((_, first)) = entries.first() else {
            return Ok(Vec::new());
        };

        let dims = first.len();
        if dims == 0 {
            return Err(Error::store("embedding has no dimensions"));
        }
        if let Some((chunk, embedding)) = entries.iter().find(|(_, e)| e.len() != dims) {
            return Err(Error::store(format!(
                "embedding for {} page {} has {} dimensions, expected {}",
                chunk.source,
                chunk.page,
                embedding.len(),
                dims
            )));
        }

        let mut conn = self.conn.lock();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT dims FROM chunks WHERE collection = ?1 LIMIT 1",
                params![self.name],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(existing) = existing {
            if existing as usize != dims {
                return Err(Error::store(format!(
                    "collection '{}' holds {}-dimensional embeddings, got {}",
                    self.name, existing, dims
                )));
            }
        }

        let batch_id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339();
        let mut ids = Vec::with_capacity(entries.len());

        let tx = conn
            .transaction()
            .map_err(|e| Error::store(format!("Failed to begin transaction: {}", e)))?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO chunks (
                    id, collection, batch_id, content, source, path,
                    page, chunk_index, dims, embedding, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )?;

            for (chunk, embedding) in entries {
                let id = Uuid::new_v4().to_string();
                stmt.execute(params![
                    id,
                    self.name,
                    batch_id,
                    chunk.content,
                    chunk.source,
                    chunk.path.to_string_lossy().into_owned(),
                    chunk.page,
                    chunk.chunk_index,
                    dims as i64,
                    encode_embedding(embedding),
                    created_at,
                ])?;
                ids.push(id);
            }
        }
        tx.commit()
            .map_err(|e| Error::store(format!("Failed to commit transaction: {}", e)))?;

        tracing::debug!("Stored {} chunks in collection '{}'", ids.len(), self.name);
        Ok(ids)
    }

    /// Most similar chunks to `query`, best first, optionally limited to one source
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        source_filter: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();

        let stored: Option<i64> = conn
            .query_row(
                "SELECT dims FROM chunks WHERE collection = ?1 LIMIT 1",
                params![self.name],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(stored) = stored {
            if stored as usize != query.len() {
                return Err(Error::store(format!(
                    "collection '{}' holds {}-dimensional embeddings, query has {}",
                    self.name,
                    stored,
                    query.len()
                )));
            }
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT content, source, path, page, chunk_index, embedding
            FROM chunks
            WHERE collection = ?1 AND (?2 IS NULL OR source = ?2)
            ORDER BY seq
            "#,
        )?;

        let rows = stmt.query_map(params![self.name, source_filter], |row| {
            let path: String = row.get(2)?;
            let embedding: Vec<u8> = row.get(5)?;
            Ok((
                Chunk {
                    content: row.get(0)?,
                    source: row.get(1)?,
                    path: PathBuf::from(path),
                    page: row.get(3)?,
                    chunk_index: row.get(4)?,
                },
                embedding,
            ))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (chunk, blob) = row?;
            let embedding = decode_embedding(&blob)?;
            if let Some(similarity) = cosine_similarity(query, &embedding) {
                scored.push(ScoredChunk { chunk, similarity });
            }
        }

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);

        Ok(scored)
    }

    /// Remove every chunk in the collection, returning how many were removed
    pub fn delete_all(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM chunks WHERE collection = ?1",
            params![self.name],
        )?;
        tracing::info!("Deleted {} chunks from collection '{}'", deleted, self.name);
        Ok(deleted)
    }

    /// Number of chunks in the collection
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// One entry per insert batch, oldest first
    pub fn manifest(&self) -> Result<Vec<ManifestEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, id, source, path, created_at
            FROM chunks
            WHERE collection = ?1
            ORDER BY seq
            "#,
        )?;

        let rows = stmt.query_map(params![self.name], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut entries: Vec<ManifestEntry> = Vec::new();
        let mut batches: Vec<String> = Vec::new();
        for row in rows {
            let (batch_id, id, source, path, created_at) = row?;
            match batches.iter().position(|b| *b == batch_id) {
                Some(idx) => entries[idx].vector_ids.push(id),
                None => {
                    batches.push(batch_id);
                    entries.push(ManifestEntry {
                        path: PathBuf::from(path),
                        source,
                        vector_ids: vec![id],
                        stored_at: DateTime::parse_from_rfc3339(&created_at)
                            .map(|d| d.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now()),
                    });
                }
            }
        }

        Ok(entries)
    }

    /// Run a trivial query to confirm the database answers
    pub fn ping(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(std::mem::size_of_val(vector));
    for &value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn decode_embedding(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(Error::store(format!(
            "invalid embedding byte length: {}",
            blob.len()
        )));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Cosine similarity, `None` when the vectors cannot be compared
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x = f64::from(x);
        let y = f64::from(y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }
    Some((dot / (norm_a.sqrt() * norm_b.sqrt())) as f32)
}
