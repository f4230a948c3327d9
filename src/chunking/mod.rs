//! Adaptive chunking pipeline for long-form transcripts.
//!
//! Converts noisy spoken-word transcripts into bounded, metadata-enriched
//! retrieval units. The pipeline runs: normalize -> recursive split -> size
//! enforcement -> optional semantic refinement -> optional parent/child
//! hierarchy -> assembly.

mod enforcer;
mod hierarchy;
mod normalize;
mod pipeline;
mod semantic;
mod splitter;

pub use enforcer::{EnforceOutcome, SizeEnforcer};
pub use hierarchy::{HierarchyBuilder, ParentChunk};
pub use normalize::Normalizer;
pub use pipeline::{ChunkingOutcome, ChunkingPipeline, ChunkingReport};
pub use semantic::{Refinement, SemanticRefiner};
pub use splitter::RecursiveSplitter;

use crate::config::ChunkingSettings;
use crate::error::{PlaybookError, Result};
use crate::transcript::TranscriptRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What kind of retrieval unit a chunk is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Produced by recursive separator splitting.
    Recursive,
    /// Produced by embedding-distance refinement.
    Semantic,
    /// Coarse context span; exempt from the child size bounds.
    Parent,
    /// Fine retrieval unit linked to a parent span.
    Child,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Recursive => "recursive",
            ChunkKind::Semantic => "semantic",
            ChunkKind::Parent => "parent",
            ChunkKind::Child => "child",
        }
    }
}

impl std::str::FromStr for ChunkKind {
    type Err = PlaybookError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "recursive" => Ok(ChunkKind::Recursive),
            "semantic" => Ok(ChunkKind::Semantic),
            "parent" => Ok(ChunkKind::Parent),
            "child" => Ok(ChunkKind::Child),
            other => Err(PlaybookError::InvalidInput(format!(
                "unknown chunk kind: {}",
                other
            ))),
        }
    }
}

/// Identifying fields copied from the originating transcript.
///
/// The core fields are fixed; anything source-specific (summary, topics)
/// lives in the `extra` side-map and is not part of the chunk contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub video_id: String,
    pub title: String,
    pub source_url: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Source-specific extras (e.g. summary, topics).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl SourceInfo {
    /// Copy the identifying fields out of a transcript record.
    pub fn from_record(record: &TranscriptRecord) -> Self {
        let mut extra = BTreeMap::new();
        if let Some(summary) = &record.summary {
            extra.insert("summary".to_string(), summary.clone());
        }
        if !record.topics.is_empty() {
            extra.insert("topics".to_string(), record.topics.join(", "));
        }

        Self {
            video_id: record.id.clone(),
            title: record.title.clone(),
            source_url: record.source_url.clone(),
            published_at: record.published_at,
            extra,
        }
    }
}

/// A bounded, self-describing retrieval unit.
///
/// Created once during preprocessing and immutable afterwards; no external
/// lookup is needed to cite its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID. Parent chunks keep the ID their children link to.
    pub id: String,
    /// Verbatim substring of the normalized transcript text.
    pub content: String,
    /// Token count of `content`, recomputed at assembly.
    pub token_count: usize,
    /// Position within the chunk sequence for this transcript.
    pub index: usize,
    /// Number of sibling chunks of the same kind-group for this transcript.
    pub total_chunks: usize,
    /// What kind of unit this is.
    pub kind: ChunkKind,
    /// ID of the parent span containing this chunk, when hierarchy is built.
    pub parent_id: Option<String>,
    /// Provenance copied from the transcript.
    pub source: SourceInfo,
}

/// Options controlling the chunking pipeline.
///
/// All sizes are token counts under the pipeline's single token counter.
#[derive(Debug, Clone)]
pub struct ChunkingOptions {
    pub max_chunk_size: usize,
    pub min_chunk_size: usize,
    pub chunk_overlap: usize,
    pub use_semantic_refinement: bool,
    pub use_hierarchy: bool,
    pub parent_chunk_size: usize,
    pub breakpoint_percentile: f64,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: 400,
            min_chunk_size: 150,
            chunk_overlap: 50,
            use_semantic_refinement: false,
            use_hierarchy: false,
            parent_chunk_size: 2000,
            breakpoint_percentile: 95.0,
        }
    }
}

impl From<&ChunkingSettings> for ChunkingOptions {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            max_chunk_size: settings.max_chunk_size,
            min_chunk_size: settings.min_chunk_size,
            chunk_overlap: settings.chunk_overlap,
            use_semantic_refinement: settings.use_semantic_refinement,
            use_hierarchy: settings.use_hierarchy,
            parent_chunk_size: settings.parent_chunk_size,
            breakpoint_percentile: settings.breakpoint_percentile,
        }
    }
}

impl ChunkingOptions {
    /// Reject option combinations that would make the pipeline misbehave.
    ///
    /// Called at pipeline construction, before any transcript is processed.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(PlaybookError::Config(
                "max_chunk_size must be positive".to_string(),
            ));
        }
        if self.max_chunk_size < self.min_chunk_size {
            return Err(PlaybookError::Config(format!(
                "max_chunk_size ({}) must be >= min_chunk_size ({})",
                self.max_chunk_size, self.min_chunk_size
            )));
        }
        if self.chunk_overlap >= self.max_chunk_size {
            return Err(PlaybookError::Config(format!(
                "chunk_overlap ({}) must be smaller than max_chunk_size ({})",
                self.chunk_overlap, self.max_chunk_size
            )));
        }
        if self.use_hierarchy && self.parent_chunk_size <= self.max_chunk_size {
            return Err(PlaybookError::Config(format!(
                "parent_chunk_size ({}) must exceed max_chunk_size ({})",
                self.parent_chunk_size, self.max_chunk_size
            )));
        }
        if !(0.0 < self.breakpoint_percentile && self.breakpoint_percentile <= 100.0) {
            return Err(PlaybookError::Config(format!(
                "breakpoint_percentile ({}) must be in (0, 100]",
                self.breakpoint_percentile
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        ChunkingOptions::default().validate().unwrap();
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let options = ChunkingOptions {
            max_chunk_size: 100,
            min_chunk_size: 200,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn source_info_carries_extras_in_side_map() {
        let record = TranscriptRecord {
            id: "v1".to_string(),
            raw_text: "text".to_string(),
            title: "Scaling".to_string(),
            source_url: "https://youtube.com/watch?v=v1".to_string(),
            published_at: None,
            summary: Some("a summary".to_string()),
            topics: vec!["offers".to_string(), "sales".to_string()],
        };

        let info = SourceInfo::from_record(&record);
        assert_eq!(info.video_id, "v1");
        assert_eq!(info.extra.get("summary").unwrap(), "a summary");
        assert_eq!(info.extra.get("topics").unwrap(), "offers, sales");
    }

    #[test]
    fn chunk_kind_round_trips() {
        for kind in [
            ChunkKind::Recursive,
            ChunkKind::Semantic,
            ChunkKind::Parent,
            ChunkKind::Child,
        ] {
            let parsed: ChunkKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }
}
