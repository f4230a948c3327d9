//! In-memory vector store implementation.
//!
//! Useful for testing and for evaluation runs over temporary indexes.

use super::{cosine_similarity, Document, IndexedTranscript, SearchResult, VectorStore};
use crate::chunking::ChunkKind;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector store.
#[derive(Default)]
pub struct MemoryVectorStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, doc: &Document) -> Result<()> {
        let mut docs = self.documents.write().unwrap();
        docs.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.documents.write().unwrap();
        for doc in docs {
            store.insert(doc.id.clone(), doc.clone());
        }
        Ok(docs.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, 0.0).await
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.documents.read().unwrap();

        let mut results: Vec<SearchResult> = docs
            .values()
            .filter(|doc| doc.kind != ChunkKind::Parent)
            .map(|doc| {
                let score = cosine_similarity(query_embedding, &doc.embedding);
                SearchResult {
                    document: doc.clone(),
                    score,
                }
            })
            .filter(|r| r.score >= min_score)
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Document>> {
        let docs = self.documents.read().unwrap();
        Ok(docs.get(id).cloned())
    }

    async fn delete_by_video_id(&self, video_id: &str) -> Result<usize> {
        let mut docs = self.documents.write().unwrap();
        let initial_len = docs.len();
        docs.retain(|_, doc| doc.video_id != video_id);
        Ok(initial_len - docs.len())
    }

    async fn list_transcripts(&self) -> Result<Vec<IndexedTranscript>> {
        let docs = self.documents.read().unwrap();

        let mut by_video: HashMap<String, IndexedTranscript> = HashMap::new();
        for doc in docs.values() {
            let entry = by_video
                .entry(doc.video_id.clone())
                .or_insert_with(|| IndexedTranscript {
                    video_id: doc.video_id.clone(),
                    video_title: doc.video_title.clone(),
                    chunk_count: 0,
                    indexed_at: doc.indexed_at,
                });
            entry.chunk_count += 1;
            if doc.indexed_at > entry.indexed_at {
                entry.indexed_at = doc.indexed_at;
            }
        }

        let mut transcripts: Vec<IndexedTranscript> = by_video.into_values().collect();
        transcripts.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));
        Ok(transcripts)
    }

    async fn is_indexed(&self, video_id: &str) -> Result<bool> {
        let docs = self.documents.read().unwrap();
        Ok(docs.values().any(|doc| doc.video_id == video_id))
    }

    async fn get_by_video_id(&self, video_id: &str) -> Result<Vec<Document>> {
        let docs = self.documents.read().unwrap();
        let mut result: Vec<Document> = docs
            .values()
            .filter(|doc| doc.video_id == video_id)
            .cloned()
            .collect();
        result.sort_by_key(|doc| doc.chunk_index);
        Ok(result)
    }

    async fn document_count(&self) -> Result<usize> {
        let docs = self.documents.read().unwrap();
        Ok(docs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::test_support::document;

    #[tokio::test]
    async fn search_ranks_by_similarity() {
        let store = MemoryVectorStore::new();

        let mut close = document("v", 0, ChunkKind::Recursive, "close match");
        close.embedding = vec![1.0, 0.0, 0.0];
        let mut far = document("v", 1, ChunkKind::Recursive, "far match");
        far.embedding = vec![0.0, 1.0, 0.0];

        store.upsert_batch(&[close, far]).await.unwrap();

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.content, "close match");
    }

    #[tokio::test]
    async fn threshold_filters_weak_matches() {
        let store = MemoryVectorStore::new();

        let mut weak = document("v", 0, ChunkKind::Recursive, "weak");
        weak.embedding = vec![0.1, 0.9, 0.0];
        store.upsert(&weak).await.unwrap();

        let results = store
            .search_with_threshold(&[1.0, 0.0, 0.0], 10, 0.5)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn delete_by_video_id_removes_all_chunks() {
        let store = MemoryVectorStore::new();
        store
            .upsert_batch(&[
                document("a", 0, ChunkKind::Recursive, "one"),
                document("a", 1, ChunkKind::Recursive, "two"),
                document("b", 0, ChunkKind::Recursive, "three"),
            ])
            .await
            .unwrap();

        assert_eq!(store.delete_by_video_id("a").await.unwrap(), 2);
        assert_eq!(store.document_count().await.unwrap(), 1);
        assert!(store.is_indexed("b").await.unwrap());
    }
}
