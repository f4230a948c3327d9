//! Pipeline orchestrator for Playbook.
//!
//! Coordinates a batch run: fetch transcripts, chunk each one, embed the
//! chunks, and index them. Transcripts share no mutable state, so a batch
//! fans out across them with bounded concurrency; one transcript failing
//! never fails the batch.

use crate::chunking::{ChunkingOptions, ChunkingPipeline};
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{PlaybookError, Result};
use crate::tokenizer::TiktokenCounter;
use crate::transcript::{JsonFileSource, SqliteWarehouse, TranscriptRecord, TranscriptSource};
use crate::vector_store::{Document, SqliteVectorStore, VectorStore};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main orchestrator for the Playbook pipeline.
pub struct Orchestrator {
    settings: Settings,
    source: Arc<dyn TranscriptSource>,
    pipeline: Arc<ChunkingPipeline>,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
}

impl Orchestrator {
    /// Create an orchestrator from settings.
    ///
    /// Settings are re-validated here so that a misconfigured pipeline is
    /// rejected before any transcript is touched.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let source: Arc<dyn TranscriptSource> = match settings.source.provider.as_str() {
            "warehouse" => Arc::new(SqliteWarehouse::open(
                &settings.warehouse_path(),
                settings.source.min_transcript_chars,
            )?),
            "file" => Arc::new(JsonFileSource::new(
                &Settings::expand_path(&settings.source.warehouse_path),
                settings.source.min_transcript_chars,
            )),
            other => {
                return Err(PlaybookError::Config(format!(
                    "unknown transcript source provider: {}",
                    other
                )))
            }
        };

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let counter = Arc::new(TiktokenCounter::with_encoding(&settings.chunking.encoding)?);
        let options = ChunkingOptions::from(&settings.chunking);
        let pipeline = Arc::new(ChunkingPipeline::new(
            options,
            counter,
            Some(embedder.clone()),
        )?);

        let vector_store: Arc<dyn VectorStore> =
            Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?);

        Ok(Self {
            settings,
            source,
            pipeline,
            embedder,
            vector_store,
        })
    }

    /// Create an orchestrator with custom components (used by tests and the
    /// evaluation harness).
    pub fn with_components(
        settings: Settings,
        source: Arc<dyn TranscriptSource>,
        pipeline: Arc<ChunkingPipeline>,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            settings,
            source,
            pipeline,
            embedder,
            vector_store,
        }
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Get a reference to the transcript source.
    pub fn source(&self) -> Arc<dyn TranscriptSource> {
        self.source.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Fetch, chunk, embed, and index a batch of transcripts.
    #[instrument(skip(self))]
    pub async fn index_batch(&self, limit: Option<usize>, force: bool) -> Result<IndexReport> {
        let limit = limit.unwrap_or(self.settings.source.fetch_limit);
        let records = self.source.fetch(limit).await?;

        let mut report = IndexReport {
            transcripts_in: records.len(),
            ..Default::default()
        };

        info!("Indexing batch of {} transcripts", records.len());

        let outcomes = stream::iter(records)
            .map(|record| async move {
                let video_id = record.id.clone();
                (video_id, self.index_record(&record, force).await)
            })
            .buffer_unordered(self.settings.indexing.max_concurrent)
            .collect::<Vec<_>>()
            .await;

        for (video_id, outcome) in outcomes {
            match outcome {
                Ok(outcome) if outcome.skipped => report.transcripts_skipped += 1,
                Ok(outcome) => {
                    report.transcripts_indexed += 1;
                    report.chunks_indexed += outcome.chunks_indexed;
                    report.chunks_dropped += outcome.chunks_dropped;
                }
                Err(e) => {
                    warn!(video_id = %video_id, error = %e, "transcript failed, continuing batch");
                    report.transcripts_failed += 1;
                }
            }
        }

        info!(
            indexed = report.transcripts_indexed,
            skipped = report.transcripts_skipped,
            failed = report.transcripts_failed,
            chunks = report.chunks_indexed,
            dropped = report.chunks_dropped,
            "batch complete"
        );

        Ok(report)
    }

    /// Chunk, embed, and index a single transcript.
    #[instrument(skip(self, record), fields(video_id = %record.id))]
    pub async fn index_record(
        &self,
        record: &TranscriptRecord,
        force: bool,
    ) -> Result<TranscriptOutcome> {
        if !force && self.vector_store.is_indexed(&record.id).await? {
            info!("already indexed, skipping");
            return Ok(TranscriptOutcome {
                video_id: record.id.clone(),
                title: record.title.clone(),
                chunks_indexed: 0,
                chunks_dropped: 0,
                skipped: true,
            });
        }

        let outcome = self.pipeline.process(record).await;
        let indexed = self.index_chunks(&record.id, outcome.chunks).await?;

        Ok(TranscriptOutcome {
            video_id: record.id.clone(),
            title: record.title.clone(),
            chunks_indexed: indexed,
            chunks_dropped: outcome.report.chunks_dropped,
            skipped: false,
        })
    }

    /// Re-chunk and re-embed an already-fetched transcript with the current
    /// settings, without touching the warehouse row.
    #[instrument(skip(self))]
    pub async fn rechunk(&self, video_id: &str) -> Result<TranscriptOutcome> {
        let record = self
            .source
            .fetch_by_id(video_id)
            .await?
            .ok_or_else(|| PlaybookError::TranscriptNotFound(video_id.to_string()))?;

        info!("Rechunking '{}'", record.title);
        self.index_record(&record, true).await
    }

    /// Embed and upsert assembled chunks, replacing any previous index
    /// entries for the transcript.
    async fn index_chunks(
        &self,
        video_id: &str,
        chunks: Vec<crate::chunking::Chunk>,
    ) -> Result<usize> {
        // Replace whatever was indexed before, even when the new chunk set
        // is empty, so stale chunks never linger.
        self.vector_store.delete_by_video_id(video_id).await?;

        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(PlaybookError::Embedding(format!(
                "embedding count mismatch: {} chunks, {} vectors",
                chunks.len(),
                embeddings.len()
            )));
        }

        let documents: Vec<Document> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Document::from_chunk(chunk, embedding))
            .collect();

        self.vector_store.upsert_batch(&documents).await
    }
}

/// Result of processing one transcript.
#[derive(Debug)]
pub struct TranscriptOutcome {
    pub video_id: String,
    pub title: String,
    pub chunks_indexed: usize,
    pub chunks_dropped: usize,
    pub skipped: bool,
}

/// Batch-level accounting: how many transcripts went in, what came out, and
/// how many chunks were silently dropped along the way.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub transcripts_in: usize,
    pub transcripts_indexed: usize,
    pub transcripts_skipped: usize,
    pub transcripts_failed: usize,
    pub chunks_indexed: usize,
    pub chunks_dropped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkingOptions;
    use crate::tokenizer::testing::WordCounter;
    use crate::vector_store::MemoryVectorStore;
    use async_trait::async_trait;

    /// Embedder returning unit vectors without any network I/O.
    struct StaticEmbedder;

    #[async_trait]
    impl Embedder for StaticEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn record(id: &str, words: usize) -> TranscriptRecord {
        TranscriptRecord {
            id: id.to_string(),
            raw_text: (1..=words).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" "),
            title: format!("Video {}", id),
            source_url: format!("https://youtube.com/watch?v={}", id),
            published_at: None,
            summary: None,
            topics: vec![],
        }
    }

    fn orchestrator(records: Vec<TranscriptRecord>) -> Orchestrator {
        let warehouse = SqliteWarehouse::in_memory(0).unwrap();
        for r in &records {
            warehouse.upsert(r).unwrap();
        }

        let options = ChunkingOptions {
            max_chunk_size: 50,
            min_chunk_size: 10,
            chunk_overlap: 0,
            ..Default::default()
        };
        let pipeline =
            ChunkingPipeline::new(options, Arc::new(WordCounter), Some(Arc::new(StaticEmbedder)))
                .unwrap();

        Orchestrator::with_components(
            Settings::default(),
            Arc::new(warehouse),
            Arc::new(pipeline),
            Arc::new(StaticEmbedder),
            Arc::new(MemoryVectorStore::new()),
        )
    }

    #[tokio::test]
    async fn batch_indexes_all_transcripts() {
        let orchestrator = orchestrator(vec![record("a", 120), record("b", 80)]);

        let report = orchestrator.index_batch(Some(10), false).await.unwrap();

        assert_eq!(report.transcripts_in, 2);
        assert_eq!(report.transcripts_indexed, 2);
        assert_eq!(report.transcripts_failed, 0);
        assert!(report.chunks_indexed > 0);

        let store = orchestrator.vector_store();
        assert!(store.is_indexed("a").await.unwrap());
        assert!(store.is_indexed("b").await.unwrap());
    }

    #[tokio::test]
    async fn already_indexed_transcripts_are_skipped_without_force() {
        let orchestrator = orchestrator(vec![record("a", 120)]);

        orchestrator.index_batch(Some(10), false).await.unwrap();
        let second = orchestrator.index_batch(Some(10), false).await.unwrap();

        assert_eq!(second.transcripts_skipped, 1);
        assert_eq!(second.transcripts_indexed, 0);
    }

    #[tokio::test]
    async fn empty_transcript_yields_zero_chunks_but_not_a_failure() {
        let orchestrator = orchestrator(vec![record("noise", 0)]);

        let report = orchestrator.index_batch(Some(10), false).await.unwrap();

        assert_eq!(report.transcripts_indexed, 1);
        assert_eq!(report.chunks_indexed, 0);
        assert_eq!(report.transcripts_failed, 0);
    }

    #[tokio::test]
    async fn rechunk_replaces_existing_chunks() {
        let orchestrator = orchestrator(vec![record("a", 120)]);
        orchestrator.index_batch(Some(10), false).await.unwrap();

        let before = orchestrator.vector_store().document_count().await.unwrap();
        let outcome = orchestrator.rechunk("a").await.unwrap();
        let after = orchestrator.vector_store().document_count().await.unwrap();

        assert!(!outcome.skipped);
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn rechunk_of_unknown_video_is_an_error() {
        let orchestrator = orchestrator(vec![]);
        assert!(orchestrator.rechunk("missing").await.is_err());
    }
}
