//! Vector store abstraction for Playbook.
//!
//! Provides a trait-based interface for different vector database backends.
//! The store treats the index as an opaque similarity-search service; parent
//! chunks are stored for context expansion but are never direct search hits.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

pub use crate::embedding::cosine_similarity;

use crate::chunking::{Chunk, ChunkKind};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Chunk ID (parents keep the ID their children reference).
    pub id: String,
    /// Source video ID.
    pub video_id: String,
    /// Source video title.
    pub video_title: String,
    /// Source video URL.
    pub source_url: String,
    /// Text content of this chunk.
    pub content: String,
    /// Token count of the content.
    pub token_count: usize,
    /// Position of this chunk within its transcript's sequence.
    pub chunk_index: usize,
    /// What kind of chunk this is.
    pub kind: ChunkKind,
    /// Parent chunk ID, for child chunks in a hierarchy.
    pub parent_id: Option<String>,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When the source video was published.
    pub published_at: Option<DateTime<Utc>>,
    /// When this document was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    /// Build a document from an assembled chunk and its embedding.
    pub fn from_chunk(chunk: &Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: chunk.id.clone(),
            video_id: chunk.source.video_id.clone(),
            video_title: chunk.source.title.clone(),
            source_url: chunk.source.source_url.clone(),
            content: chunk.content.clone(),
            token_count: chunk.token_count,
            chunk_index: chunk.index,
            kind: chunk.kind,
            parent_id: chunk.parent_id.clone(),
            embedding,
            published_at: chunk.source.published_at,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Summary information about an indexed transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedTranscript {
    /// Source video ID.
    pub video_id: String,
    /// Source video title.
    pub video_title: String,
    /// Number of indexed chunks, parents included.
    pub chunk_count: u32,
    /// When the transcript was indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a document with its embedding.
    async fn upsert(&self, doc: &Document) -> Result<()>;

    /// Bulk upsert documents.
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize>;

    /// Search for similar documents. Parent chunks are excluded; they are
    /// context, not retrieval targets.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Fetch a document by chunk ID (used for parent expansion).
    async fn get_by_id(&self, id: &str) -> Result<Option<Document>>;

    /// Delete documents by video ID.
    async fn delete_by_video_id(&self, video_id: &str) -> Result<usize>;

    /// List all indexed transcripts.
    async fn list_transcripts(&self) -> Result<Vec<IndexedTranscript>>;

    /// Check if a transcript is indexed.
    async fn is_indexed(&self, video_id: &str) -> Result<bool>;

    /// Get all documents for a video, in chunk order.
    async fn get_by_video_id(&self, video_id: &str) -> Result<Vec<Document>>;

    /// Get total document count.
    async fn document_count(&self) -> Result<usize>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::chunking::SourceInfo;
    use std::collections::BTreeMap;

    /// Build a document with a one-hot embedding for store tests.
    pub fn document(video_id: &str, index: usize, kind: ChunkKind, content: &str) -> Document {
        let chunk = Chunk {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.to_string(),
            token_count: content.split_whitespace().count(),
            index,
            total_chunks: 1,
            kind,
            parent_id: None,
            source: SourceInfo {
                video_id: video_id.to_string(),
                title: format!("Video {}", video_id),
                source_url: format!("https://youtube.com/watch?v={}", video_id),
                published_at: None,
                extra: BTreeMap::new(),
            },
        };
        Document::from_chunk(&chunk, vec![1.0, 0.0, 0.0])
    }
}
