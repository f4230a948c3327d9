//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! For large datasets, consider the sqlite-vec extension or a dedicated
//! vector database.

use super::{cosine_similarity, Document, IndexedTranscript, SearchResult, VectorStore};
use crate::chunking::ChunkKind;
use crate::error::{PlaybookError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    video_id TEXT NOT NULL,
    video_title TEXT NOT NULL,
    source_url TEXT NOT NULL,
    content TEXT NOT NULL,
    token_count INTEGER NOT NULL,
    chunk_index INTEGER NOT NULL,
    kind TEXT NOT NULL,
    parent_id TEXT,
    embedding BLOB NOT NULL,
    published_at TEXT,
    indexed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_video_id ON documents(video_id);
CREATE INDEX IF NOT EXISTS idx_documents_kind ON documents(kind);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Create a new SQLite vector store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL mode for better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PlaybookError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
        let embedding_bytes: Vec<u8> = row.get(9)?;
        let kind_str: String = row.get(7)?;
        let published_str: Option<String> = row.get(10)?;
        let indexed_at_str: String = row.get(11)?;

        Ok(Document {
            id: row.get(0)?,
            video_id: row.get(1)?,
            video_title: row.get(2)?,
            source_url: row.get(3)?,
            content: row.get(4)?,
            token_count: row.get::<_, i64>(5)? as usize,
            chunk_index: row.get::<_, i64>(6)? as usize,
            kind: kind_str.parse().unwrap_or(ChunkKind::Recursive),
            parent_id: row.get(8)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            published_at: published_str.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
            indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    fn insert_document(tx: &Connection, doc: &Document) -> Result<()> {
        let embedding_bytes = Self::embedding_to_bytes(&doc.embedding);

        tx.execute(
            r#"
            INSERT OR REPLACE INTO documents
            (id, video_id, video_title, source_url, content, token_count,
             chunk_index, kind, parent_id, embedding, published_at, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                doc.id,
                doc.video_id,
                doc.video_title,
                doc.source_url,
                doc.content,
                doc.token_count as i64,
                doc.chunk_index as i64,
                doc.kind.as_str(),
                doc.parent_id,
                embedding_bytes,
                doc.published_at.map(|dt| dt.to_rfc3339()),
                doc.indexed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, doc))]
    async fn upsert(&self, doc: &Document) -> Result<()> {
        let conn = self.lock()?;
        Self::insert_document(&conn, doc)?;
        debug!("Upserted document {}", doc.id);
        Ok(())
    }

    #[instrument(skip(self, docs))]
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for doc in docs {
            Self::insert_document(&tx, doc)?;
        }

        tx.commit()?;
        info!("Batch upserted {} documents", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, 0.0).await
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, video_id, video_title, source_url, content, token_count,
                   chunk_index, kind, parent_id, embedding, published_at, indexed_at
            FROM documents
            WHERE kind != 'parent'
            "#,
        )?;

        let docs = stmt.query_map([], |row| Self::row_to_document(row))?;

        let mut results: Vec<SearchResult> = docs
            .filter_map(|doc| doc.ok())
            .map(|doc| {
                let score = cosine_similarity(query_embedding, &doc.embedding);
                SearchResult {
                    document: doc,
                    score,
                }
            })
            .filter(|r| r.score >= min_score)
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> Result<Option<Document>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            r#"
            SELECT id, video_id, video_title, source_url, content, token_count,
                   chunk_index, kind, parent_id, embedding, published_at, indexed_at
            FROM documents
            WHERE id = ?1
            "#,
            params![id],
            |row| Self::row_to_document(row),
        );

        match result {
            Ok(doc) => Ok(Some(doc)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn delete_by_video_id(&self, video_id: &str) -> Result<usize> {
        let conn = self.lock()?;

        let deleted = conn.execute(
            "DELETE FROM documents WHERE video_id = ?1",
            params![video_id],
        )?;

        info!("Deleted {} documents for video {}", deleted, video_id);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_transcripts(&self) -> Result<Vec<IndexedTranscript>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT video_id, video_title, COUNT(*) as chunk_count,
                   MAX(indexed_at) as indexed_at
            FROM documents
            GROUP BY video_id
            ORDER BY indexed_at DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let indexed_at_str: String = row.get(3)?;
            Ok(IndexedTranscript {
                video_id: row.get(0)?,
                video_title: row.get(1)?,
                chunk_count: row.get(2)?,
                indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    async fn is_indexed(&self, video_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE video_id = ?1",
            params![video_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn get_by_video_id(&self, video_id: &str) -> Result<Vec<Document>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, video_id, video_title, source_url, content, token_count,
                   chunk_index, kind, parent_id, embedding, published_at, indexed_at
            FROM documents
            WHERE video_id = ?1
            ORDER BY chunk_index
            "#,
        )?;

        let docs = stmt.query_map(params![video_id], |row| Self::row_to_document(row))?;
        let result: Vec<Document> = docs.filter_map(|d| d.ok()).collect();

        debug!("Found {} documents for video {}", result.len(), video_id);
        Ok(result)
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::test_support::document;

    #[tokio::test]
    async fn upsert_search_delete_roundtrip() {
        let store = SqliteVectorStore::in_memory().unwrap();

        let doc = document("video1", 0, ChunkKind::Recursive, "pricing is positioning");
        store.upsert(&doc).await.unwrap();

        let transcripts = store.list_transcripts().await.unwrap();
        assert_eq!(transcripts.len(), 1);
        assert_eq!(transcripts[0].video_id, "video1");

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 0.001);

        let deleted = store.delete_by_video_id("video1").await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store.list_transcripts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn parents_are_stored_but_never_searched() {
        let store = SqliteVectorStore::in_memory().unwrap();

        store
            .upsert(&document("v", 0, ChunkKind::Child, "a child chunk"))
            .await
            .unwrap();
        store
            .upsert(&document("v", 1, ChunkKind::Parent, "a parent span"))
            .await
            .unwrap();

        assert_eq!(store.document_count().await.unwrap(), 2);

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.kind, ChunkKind::Child);
    }

    #[tokio::test]
    async fn get_by_id_resolves_parent_links() {
        let store = SqliteVectorStore::in_memory().unwrap();

        let parent = document("v", 1, ChunkKind::Parent, "a parent span");
        store.upsert(&parent).await.unwrap();

        let fetched = store.get_by_id(&parent.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "a parent span");
        assert!(store.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn kind_round_trips_through_storage() {
        let store = SqliteVectorStore::in_memory().unwrap();

        for (i, kind) in [ChunkKind::Recursive, ChunkKind::Semantic, ChunkKind::Child]
            .into_iter()
            .enumerate()
        {
            store
                .upsert(&document("v", i, kind, "content"))
                .await
                .unwrap();
        }

        let docs = store.get_by_video_id("v").await.unwrap();
        let kinds: Vec<ChunkKind> = docs.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![ChunkKind::Recursive, ChunkKind::Semantic, ChunkKind::Child]
        );
    }
}
