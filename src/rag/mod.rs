//! RAG (Retrieval-Augmented Generation) for question answering with sources.

pub mod context;
mod response;

pub use context::{ContextBuilder, ContextBundle};
pub use response::{RagEngine, RagResponse};

use crate::chunking::ChunkKind;
use crate::vector_store::{Document, SearchResult};

/// A retrieved chunk with the fields needed to cite it.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    /// Chunk ID.
    pub chunk_id: String,
    /// Source video ID.
    pub video_id: String,
    /// Source video title.
    pub video_title: String,
    /// Source video URL.
    pub source_url: String,
    /// Text content.
    pub content: String,
    /// Similarity score (parents inherit their best child's score).
    pub score: f32,
    /// What kind of chunk this is.
    pub kind: ChunkKind,
    /// Parent chunk ID, when hierarchy is enabled.
    pub parent_id: Option<String>,
}

impl ContextChunk {
    fn from_document(document: &Document, score: f32) -> Self {
        Self {
            chunk_id: document.id.clone(),
            video_id: document.video_id.clone(),
            video_title: document.video_title.clone(),
            source_url: document.source_url.clone(),
            content: document.content.clone(),
            score,
            kind: document.kind,
            parent_id: document.parent_id.clone(),
        }
    }
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self::from_document(&result.document, result.score)
    }
}
