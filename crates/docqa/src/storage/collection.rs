//! Persistent cosine-space vector collection on SQLite
//!
//! Every chunk is one row keyed by `(collection, "<source_file>_<index>")`.
//! Embeddings are stored as little-endian `f32` blobs and searched by brute
//! force, which keeps the store a single file with no index to rebuild.

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::config::{RagConfig, COLLECTION_NAME};
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{entry_id, parse_entry_id, Chunk, ChunkMetadata, QueryMatch};

/// File name of the database inside `vector_store_path`
pub const DB_FILE_NAME: &str = "docqa.sqlite3";

/// Distance space recorded for the collection
pub const DISTANCE_SPACE: &str = "cosine";

/// A stored row, as loaded for search
struct StoredEntry {
    id: String,
    document: String,
    metadata: String,
    embedding: Vec<f32>,
}

/// Vector store adapter over one named collection
pub struct VectorStore {
    conn: Arc<Mutex<Connection>>,
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl VectorStore {
    /// Open (or create) the store under `config.vector_store_path`
    pub fn open(config: &RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        std::fs::create_dir_all(&config.vector_store_path).map_err(|e| {
            Error::vector_store(format!(
                "Failed to create {}: {}",
                config.vector_store_path.display(),
                e
            ))
        })?;
        Self::open_path(config.vector_store_path.join(DB_FILE_NAME), embedder)
    }

    /// Open (or create) the database file at `path`
    pub fn open_path<P: AsRef<Path>>(path: P, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            tracing::error!("Failed to open vector store at {}: {}", path.display(), e);
            Error::vector_store(format!("Failed to open database: {}", e))
        })?;

        let store = Self::with_connection(conn, embedder)?;
        tracing::info!(
            "Opened collection '{}' at {}",
            store.collection,
            path.display()
        );
        Ok(store)
    }

    /// Create an in-memory store
    pub fn in_memory(embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::vector_store(format!("Failed to open in-memory database: {}", e)))?;
        Self::with_connection(conn, embedder)
    }

    fn with_connection(conn: Connection, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: COLLECTION_NAME.to_string(),
            embedder,
        };
        store.migrate()?;
        Ok(store)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
        "#,
        )?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                space TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS entries (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                document TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (collection, id)
            );
        "#,
        )?;

        conn.execute(
            "INSERT OR IGNORE INTO collections (name, space, created_at) VALUES (?1, ?2, ?3)",
            params![self.collection, DISTANCE_SPACE, Utc::now().to_rfc3339()],
        )?;

        let space: String = conn.query_row(
            "SELECT space FROM collections WHERE name = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        if space != DISTANCE_SPACE {
            return Err(Error::vector_store(format!(
                "Collection '{}' uses '{}' space, expected '{}'",
                self.collection, space, DISTANCE_SPACE
            )));
        }

        Ok(())
    }

    /// Name of the collection
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Embed and write chunks; ids are `<source_file>_<position>`
    ///
    /// Existing ids are overwritten, so repeating an upsert changes nothing.
    /// Returns the number of rows written.
    pub async fn upsert(&self, chunks: &[Chunk], source_file: &str) -> Result<usize> {
        self.write(chunks, source_file, false).await
    }

    /// Swap every entry of `source_file` for `chunks`
    ///
    /// The chunks are embedded before anything is removed, and the removal and
    /// the insert share one transaction: on any failure the old entries stay.
    pub async fn replace(&self, chunks: &[Chunk], source_file: &str) -> Result<usize> {
        self.write(chunks, source_file, true).await
    }

    async fn write(&self, chunks: &[Chunk], source_file: &str, replace: bool) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            tracing::error!("Embedding {} chunks of '{}' failed: {}", texts.len(), source_file, e);
            e
        })?;

        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let rows: Vec<(String, String, String, Vec<u8>)> = chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(position, (chunk, embedding))| {
                let metadata = ChunkMetadata {
                    source_file: source_file.to_string(),
                    chunk_index: chunk.chunk_index,
                };
                Ok((
                    entry_id(source_file, position as u32),
                    chunk.text.clone(),
                    serde_json::to_string(&metadata)?,
                    encode_embedding(&embedding),
                ))
            })
            .collect::<Result<_>>()?;

        let conn = Arc::clone(&self.conn);
        let collection = self.collection.clone();
        let name = source_file.to_string();

        let (removed, written) = tokio::task::spawn_blocking(move || -> Result<(usize, usize)> {
            let mut conn = conn.lock();
            let tx = conn.transaction()?;
            let mut removed = 0;
            if replace {
                let ids = {
                    let mut stmt = tx.prepare("SELECT id FROM entries WHERE collection = ?1")?;
                    let ids = stmt
                        .query_map(params![collection], |row| row.get::<_, String>(0))?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    ids
                };
                let mut stmt = tx.prepare("DELETE FROM entries WHERE collection = ?1 AND id = ?2")?;
                for id in ids.iter().filter(|id| belongs_to(id, &name)) {
                    removed += stmt.execute(params![collection, id])?;
                }
            }
            {
                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO entries (collection, id, document, metadata, embedding)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(collection, id) DO UPDATE SET
                        document = excluded.document,
                        metadata = excluded.metadata,
                        embedding = excluded.embedding
                "#,
                )?;
                for (id, document, metadata, embedding) in &rows {
                    stmt.execute(params![collection, id, document, metadata, embedding])?;
                }
            }
            tx.commit()?;
            Ok((removed, rows.len()))
        })
        .await?
        .map_err(|e| {
            tracing::error!("Failed to write '{}': {}", source_file, e);
            e
        })?;

        if replace {
            tracing::info!(
                "Replaced {} entries for '{}' with {}",
                removed,
                source_file,
                written
            );
        } else {
            tracing::info!("Upserted {} entries for '{}'", written, source_file);
        }
        Ok(written)
    }

    /// Nearest entries to `question`, closest first
    ///
    /// Returns an empty list without calling the embedder when the collection
    /// is empty or `n_results` is 0.
    pub async fn query(&self, question: &str, n_results: usize) -> Result<Vec<QueryMatch>> {
        if n_results == 0 || self.count().await? == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(question).await.map_err(|e| {
            tracing::error!("Embedding the question failed: {}", e);
            e
        })?;

        let entries = self.load_entries().await?;

        let mut matches = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.embedding.len() != query_embedding.len() {
                tracing::error!(
                    "Dimension mismatch for '{}': stored {}, query {}",
                    entry.id,
                    entry.embedding.len(),
                    query_embedding.len()
                );
                return Err(Error::vector_store(format!(
                    "Embedding dimension mismatch: stored {}, query {}",
                    entry.embedding.len(),
                    query_embedding.len()
                )));
            }

            let metadata: ChunkMetadata = serde_json::from_str(&entry.metadata)?;
            matches.push(QueryMatch {
                distance: cosine_distance(&query_embedding, &entry.embedding),
                entry_id: entry.id,
                text: entry.document,
                metadata,
            });
        }

        // Stable: equal distances keep insertion order
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(n_results);

        tracing::debug!("Query matched {} entries", matches.len());
        Ok(matches)
    }

    /// Distinct source file names, sorted
    pub async fn list_documents(&self) -> Result<Vec<String>> {
        let ids = self.load_ids().await?;
        let names: BTreeSet<String> = ids
            .iter()
            .filter_map(|id| parse_entry_id(id).map(|(name, _)| name.to_string()))
            .collect();
        Ok(names.into_iter().collect())
    }

    /// Whether any entry belongs to `source_file`
    pub async fn contains_document(&self, source_file: &str) -> Result<bool> {
        let ids = self.load_ids().await?;
        Ok(ids.iter().any(|id| belongs_to(id, source_file)))
    }

    /// Remove every entry of `source_file`; returns how many were removed
    pub async fn delete(&self, source_file: &str) -> Result<usize> {
        let ids: Vec<String> = self
            .load_ids()
            .await?
            .into_iter()
            .filter(|id| belongs_to(id, source_file))
            .collect();

        if ids.is_empty() {
            tracing::info!("No entries to delete for '{}'", source_file);
            return Ok(0);
        }

        let conn = Arc::clone(&self.conn);
        let collection = self.collection.clone();

        let deleted = tokio::task::spawn_blocking(move || -> Result<usize> {
            let mut conn = conn.lock();
            let tx = conn.transaction()?;
            let mut deleted = 0;
            {
                let mut stmt = tx.prepare("DELETE FROM entries WHERE collection = ?1 AND id = ?2")?;
                for id in &ids {
                    deleted += stmt.execute(params![collection, id])?;
                }
            }
            tx.commit()?;
            Ok(deleted)
        })
        .await?
        .map_err(|e| {
            tracing::error!("Failed to delete '{}': {}", source_file, e);
            e
        })?;

        tracing::info!("Deleted {} entries for '{}'", deleted, source_file);
        Ok(deleted)
    }

    /// Number of entries in the collection
    pub async fn count(&self) -> Result<usize> {
        let conn = Arc::clone(&self.conn);
        let collection = self.collection.clone();

        tokio::task::spawn_blocking(move || -> Result<usize> {
            let conn = conn.lock();
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM entries WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
        .await?
    }

    async fn load_ids(&self) -> Result<Vec<String>> {
        let conn = Arc::clone(&self.conn);
        let collection = self.collection.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            let conn = conn.lock();
            let mut stmt =
                conn.prepare("SELECT id FROM entries WHERE collection = ?1 ORDER BY rowid")?;
            let ids = stmt
                .query_map(params![collection], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(ids)
        })
        .await?
    }

    async fn load_entries(&self) -> Result<Vec<StoredEntry>> {
        let conn = Arc::clone(&self.conn);
        let collection = self.collection.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<StoredEntry>> {
            let conn = conn.lock();
            let mut stmt = conn.prepare(
                "SELECT id, document, metadata, embedding FROM entries \
                 WHERE collection = ?1 ORDER BY rowid",
            )?;
            let entries = stmt
                .query_map(params![collection], |row| {
                    let blob: Vec<u8> = row.get(3)?;
                    Ok(StoredEntry {
                        id: row.get(0)?,
                        document: row.get(1)?,
                        metadata: row.get(2)?,
                        embedding: decode_embedding(&blob),
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
        .await?
    }
}

/// `id == "<source_file>_<digits>"`
fn belongs_to(id: &str, source_file: &str) -> bool {
    id.strip_prefix(source_file)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

/// Cosine distance `1 - cos(a, b)`; a zero vector is at distance 1.0 from everything
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps known words onto fixed axes
    struct AxisEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for AxisEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let lower = text.to_lowercase();
            Ok(["cat", "dog", "fish"]
                .iter()
                .map(|w| if lower.contains(w) { 1.0 } else { 0.0 })
                .collect())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "axis"
        }
    }

    fn store() -> (VectorStore, Arc<AxisEmbedder>) {
        let embedder = Arc::new(AxisEmbedder {
            calls: AtomicUsize::new(0),
        });
        (VectorStore::in_memory(embedder.clone()).unwrap(), embedder)
    }

    #[test]
    fn test_cosine_distance() {
        assert!((cosine_distance(&[1.0, 0.0], &[1.0, 0.0])).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn test_embedding_blob() {
        let v = vec![0.5, -1.25, 3.0];
        assert_eq!(decode_embedding(&encode_embedding(&v)), v);
    }

    #[test]
    fn test_belongs_to() {
        assert!(belongs_to("report.pdf_0", "report.pdf"));
        assert!(belongs_to("report.pdf_17", "report.pdf"));
        assert!(!belongs_to("report_v2.pdf_0", "report.pdf"));
        assert!(!belongs_to("report.pdf_x", "report.pdf"));
        assert!(!belongs_to("report.pdf", "report.pdf"));
    }

    #[tokio::test]
    async fn test_query_orders_by_distance() {
        let (store, _) = store();
        let chunks = vec![
            Chunk::new("the dog barks", "pets.txt", 0),
            Chunk::new("the cat sleeps", "pets.txt", 1),
            Chunk::new("a fish swims", "pets.txt", 2),
        ];
        assert_eq!(store.upsert(&chunks, "pets.txt").await.unwrap(), 3);

        let matches = store.query("where is the cat?", 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].entry_id, "pets.txt_1");
        assert_eq!(matches[0].metadata.chunk_index, 1);
        assert!(matches[0].distance < 1e-6);
        // remaining distances are all 1.0, insertion order wins
        assert_eq!(matches[1].entry_id, "pets.txt_0");
    }

    #[tokio::test]
    async fn test_empty_collection_skips_embedding() {
        let (store, embedder) = store();
        assert!(store.query("anything", 5).await.unwrap().is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);

        store.upsert(&[Chunk::new("cat", "a.txt", 0)], "a.txt").await.unwrap();
        let calls = embedder.calls.load(Ordering::SeqCst);
        assert!(store.query("cat", 0).await.unwrap().is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (store, _) = store();
        store.upsert(&[Chunk::new("cat", "b.txt", 0)], "b.txt").await.unwrap();
        store
            .upsert(&[Chunk::new("dog", "a_1.txt", 0), Chunk::new("fish", "a_1.txt", 1)], "a_1.txt")
            .await
            .unwrap();

        assert_eq!(store.list_documents().await.unwrap(), vec!["a_1.txt", "b.txt"]);
        assert!(store.contains_document("a_1.txt").await.unwrap());
        assert!(!store.contains_document("a").await.unwrap());

        assert_eq!(store.delete("a_1.txt").await.unwrap(), 2);
        assert_eq!(store.delete("a_1.txt").await.unwrap(), 0);
        assert_eq!(store.list_documents().await.unwrap(), vec!["b.txt"]);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_drops_stale_entries() {
        let (store, _) = store();
        let long = vec![
            Chunk::new("cat one", "pets.txt", 0),
            Chunk::new("cat two", "pets.txt", 1),
            Chunk::new("cat three", "pets.txt", 2),
        ];
        store.upsert(&long, "pets.txt").await.unwrap();
        store.upsert(&[Chunk::new("fish", "pets_2.txt", 0)], "pets_2.txt").await.unwrap();

        let written = store
            .replace(&[Chunk::new("dog only", "pets.txt", 0)], "pets.txt")
            .await
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(store.count().await.unwrap(), 2);

        let matches = store.query("dog", 5).await.unwrap();
        assert_eq!(matches[0].entry_id, "pets.txt_0");
        assert_eq!(matches[0].text, "dog only");
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_old_entries() {
        struct Flaky(AtomicUsize);

        #[async_trait]
        impl EmbeddingProvider for Flaky {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                if self.0.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(vec![1.0, 0.0])
                } else {
                    Err(Error::embedding("model unloaded"))
                }
            }
            async fn health_check(&self) -> Result<bool> {
                Ok(true)
            }
            fn name(&self) -> &str {
                "flaky"
            }
        }

        let store = VectorStore::in_memory(Arc::new(Flaky(AtomicUsize::new(0)))).unwrap();
        store.upsert(&[Chunk::new("kept", "a.txt", 0)], "a.txt").await.unwrap();

        let err = store
            .replace(&[Chunk::new("new", "a.txt", 0)], "a.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert_eq!(store.list_documents().await.unwrap(), vec!["a.txt"]);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_an_error() {
        struct Growing(AtomicUsize);

        #[async_trait]
        impl EmbeddingProvider for Growing {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                let n = self.0.fetch_add(1, Ordering::SeqCst) + 2;
                Ok(vec![1.0; n])
            }
            async fn health_check(&self) -> Result<bool> {
                Ok(true)
            }
            fn name(&self) -> &str {
                "growing"
            }
        }

        let store = VectorStore::in_memory(Arc::new(Growing(AtomicUsize::new(0)))).unwrap();
        store.upsert(&[Chunk::new("x", "x.txt", 0)], "x.txt").await.unwrap();
        let err = store.query("y", 3).await.unwrap_err();
        assert!(matches!(err, Error::VectorStore(_)));
    }
}
