//! Transcript sources for Playbook.
//!
//! A transcript is a single long-form spoken-word document (a coaching video
//! transcript) plus the metadata that travels with every chunk cut from it.

mod file;
mod warehouse;

pub use file::JsonFileSource;
pub use warehouse::SqliteWarehouse;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw transcript with its enrichment metadata.
///
/// Immutable input to the chunking pipeline; created by a source, consumed
/// once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRecord {
    /// Source video ID.
    pub id: String,
    /// Full transcript text as fetched.
    pub raw_text: String,
    /// Video title.
    pub title: String,
    /// URL of the source video.
    pub source_url: String,
    /// When the video was published.
    pub published_at: Option<DateTime<Utc>>,
    /// Optional editorial summary of the video.
    #[serde(default)]
    pub summary: Option<String>,
    /// Optional ordered topic labels.
    #[serde(default)]
    pub topics: Vec<String>,
}

impl TranscriptRecord {
    /// Check whether the transcript carries enough text to be worth chunking.
    pub fn has_usable_text(&self, min_chars: usize) -> bool {
        self.raw_text.trim().len() >= min_chars
    }
}

/// Trait for transcript sources.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch up to `limit` transcripts, newest first.
    async fn fetch(&self, limit: usize) -> Result<Vec<TranscriptRecord>>;

    /// Fetch a single transcript by video ID.
    async fn fetch_by_id(&self, id: &str) -> Result<Option<TranscriptRecord>>;
}
