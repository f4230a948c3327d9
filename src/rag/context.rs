//! Context building for RAG responses.
//!
//! Retrieves the most relevant chunks for a query, deduplicates them by
//! content hash, and expands child chunks to their parent spans when a
//! hierarchy was indexed.

use super::ContextChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, warn};

/// Retrieved context: deduplicated chunks plus their mapped parents.
#[derive(Debug, Clone, Default)]
pub struct ContextBundle {
    /// Deduplicated chunks, best match first.
    pub chunks: Vec<ContextChunk>,
    /// Parent spans of the retrieved chunks, deduplicated by ID.
    pub parents: Vec<ContextChunk>,
}

impl ContextBundle {
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Serialize all blocks for grounding a prompt.
    ///
    /// Each chunk renders as a `Source ... | Chunk ...` header followed by
    /// its content; blocks are joined by blank lines, parents last.
    pub fn serialize(&self) -> String {
        self.chunks
            .iter()
            .chain(self.parents.iter())
            .map(|chunk| {
                format!(
                    "Source: {} ({}) | Chunk: {}\nContent: {}",
                    chunk.video_title, chunk.source_url, chunk.chunk_id, chunk.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Builds context from search results for RAG.
pub struct ContextBuilder {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_chunks: usize,
    min_score: f32,
    expand_parents: bool,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            max_chunks: 10,
            min_score: 0.3,
            expand_parents: true,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Enable or disable parent expansion.
    pub fn with_parent_expansion(mut self, expand: bool) -> Self {
        self.expand_parents = expand;
        self
    }

    /// Build context for a query.
    pub async fn build(&self, query: &str) -> Result<ContextBundle> {
        let query_embedding = self.embedder.embed(query).await?;

        // Over-fetch so post-dedup truncation still fills the budget.
        let results = self
            .vector_store
            .search_with_threshold(&query_embedding, self.max_chunks * 2, self.min_score)
            .await?;

        let mut seen_hashes: HashSet<u64> = HashSet::new();
        let mut chunks: Vec<ContextChunk> = Vec::new();
        for result in results {
            if !seen_hashes.insert(content_hash(&result.document.content)) {
                continue;
            }
            chunks.push(result.into());
            if chunks.len() >= self.max_chunks {
                break;
            }
        }

        let parents = if self.expand_parents {
            self.fetch_parents(&chunks).await
        } else {
            Vec::new()
        };

        debug!(
            chunks = chunks.len(),
            parents = parents.len(),
            "built retrieval context"
        );

        Ok(ContextBundle { chunks, parents })
    }

    /// Fetch the parent span of every retrieved child, deduplicated by ID.
    ///
    /// A missing parent row is logged and skipped; retrieval still succeeds
    /// with the child chunks alone.
    async fn fetch_parents(&self, chunks: &[ContextChunk]) -> Vec<ContextChunk> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut parents = Vec::new();

        for chunk in chunks {
            let Some(parent_id) = &chunk.parent_id else {
                continue;
            };
            if !seen.insert(parent_id.clone()) {
                continue;
            }

            match self.vector_store.get_by_id(parent_id).await {
                Ok(Some(parent_doc)) => {
                    parents.push(ContextChunk::from_document(&parent_doc, chunk.score));
                }
                Ok(None) => {
                    warn!(parent_id = %parent_id, "parent chunk missing from index");
                }
                Err(e) => {
                    warn!(parent_id = %parent_id, error = %e, "parent lookup failed");
                }
            }
        }

        parents
    }
}

/// Stable hash of chunk content, used for retrieval-time deduplication.
pub fn content_hash(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkKind;
    use crate::error::Result;
    use crate::vector_store::{test_support::document, MemoryVectorStore};
    use async_trait::async_trait;

    /// Embedder returning a fixed unit vector for any input.
    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    #[tokio::test]
    async fn duplicate_content_is_deduplicated() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert_batch(&[
                document("a", 0, ChunkKind::Recursive, "the same advice"),
                document("b", 0, ChunkKind::Recursive, "the same advice"),
                document("c", 0, ChunkKind::Recursive, "different advice"),
            ])
            .await
            .unwrap();

        let builder = ContextBuilder::new(store, Arc::new(FixedEmbedder)).with_min_score(0.0);
        let bundle = builder.build("any question").await.unwrap();

        assert_eq!(bundle.chunks.len(), 2);
        let contents: HashSet<&str> = bundle.chunks.iter().map(|c| c.content.as_str()).collect();
        assert!(contents.contains("the same advice"));
        assert!(contents.contains("different advice"));
    }

    #[tokio::test]
    async fn parents_are_expanded_once_per_id() {
        let store = Arc::new(MemoryVectorStore::new());

        let parent = document("v", 2, ChunkKind::Parent, "the full parent span");
        let mut child_a = document("v", 0, ChunkKind::Child, "first child");
        child_a.parent_id = Some(parent.id.clone());
        let mut child_b = document("v", 1, ChunkKind::Child, "second child");
        child_b.parent_id = Some(parent.id.clone());

        store
            .upsert_batch(&[parent.clone(), child_a, child_b])
            .await
            .unwrap();

        let builder = ContextBuilder::new(store, Arc::new(FixedEmbedder)).with_min_score(0.0);
        let bundle = builder.build("question").await.unwrap();

        assert_eq!(bundle.chunks.len(), 2);
        assert_eq!(bundle.parents.len(), 1);
        assert_eq!(bundle.parents[0].chunk_id, parent.id);
    }

    #[tokio::test]
    async fn serialization_uses_source_and_chunk_blocks() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert(&document("v", 0, ChunkKind::Recursive, "price on value"))
            .await
            .unwrap();

        let builder = ContextBuilder::new(store, Arc::new(FixedEmbedder)).with_min_score(0.0);
        let bundle = builder.build("pricing").await.unwrap();
        let serialized = bundle.serialize();

        assert!(serialized.starts_with("Source: Video v"));
        assert!(serialized.contains("| Chunk: "));
        assert!(serialized.contains("\nContent: price on value"));
    }

    #[test]
    fn content_hash_is_stable_and_discriminating() {
        assert_eq!(content_hash("same"), content_hash("same"));
        assert_ne!(content_hash("same"), content_hash("different"));
    }
}
