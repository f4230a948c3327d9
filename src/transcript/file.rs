//! JSON file transcript source.
//!
//! Reads an exported JSON array of transcript records, the interchange format
//! produced by the upstream fetch tooling.

use super::{TranscriptRecord, TranscriptSource};
use crate::error::{PlaybookError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Transcript source backed by a JSON file on disk.
pub struct JsonFileSource {
    path: PathBuf,
    min_chars: usize,
}

impl JsonFileSource {
    /// Create a source reading from the given file.
    pub fn new(path: &Path, min_chars: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            min_chars,
        }
    }

    fn load(&self) -> Result<Vec<TranscriptRecord>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            PlaybookError::TranscriptSource(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let records: Vec<TranscriptRecord> = serde_json::from_str(&content).map_err(|e| {
            PlaybookError::TranscriptSource(format!(
                "failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(records)
    }
}

#[async_trait]
impl TranscriptSource for JsonFileSource {
    async fn fetch(&self, limit: usize) -> Result<Vec<TranscriptRecord>> {
        let mut records: Vec<TranscriptRecord> = self
            .load()?
            .into_iter()
            .filter(|r| r.has_usable_text(self.min_chars))
            .collect();

        // Newest first, records without a date last.
        records.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        records.truncate(limit);

        info!(
            "Loaded {} transcripts from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<TranscriptRecord>> {
        Ok(self.load()?.into_iter().find(|r| r.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_dataset(records: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(records.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn fetch_filters_short_transcripts() {
        let file = write_dataset(
            r#"[
                {"id": "a", "raw_text": "tiny", "title": "A", "source_url": "u", "published_at": null},
                {"id": "b", "raw_text": "a transcript long enough to keep", "title": "B", "source_url": "u", "published_at": null}
            ]"#,
        );

        let source = JsonFileSource::new(file.path(), 10);
        let records = source.fetch(10).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "b");
    }

    #[tokio::test]
    async fn fetch_by_id_finds_record() {
        let file = write_dataset(
            r#"[{"id": "a", "raw_text": "text", "title": "A", "source_url": "u", "published_at": null}]"#,
        );

        let source = JsonFileSource::new(file.path(), 0);
        assert!(source.fetch_by_id("a").await.unwrap().is_some());
        assert!(source.fetch_by_id("missing").await.unwrap().is_none());
    }
}
