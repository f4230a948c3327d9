//! The chunking pipeline: stage orchestration and chunk assembly.

use super::{
    Chunk, ChunkKind, ChunkingOptions, HierarchyBuilder, Normalizer, Refinement, RecursiveSplitter,
    SemanticRefiner, SizeEnforcer, SourceInfo,
};
use crate::embedding::Embedder;
use crate::error::{PlaybookError, Result};
use crate::tokenizer::SharedTokenCounter;
use crate::transcript::TranscriptRecord;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Per-transcript accounting for batch summaries.
///
/// Undersized drops never raise; this report is what keeps them auditable.
#[derive(Debug, Clone, Default)]
pub struct ChunkingReport {
    /// Chunks emitted, parents included.
    pub chunks_emitted: usize,
    /// Candidates discarded during size enforcement.
    pub chunks_dropped: usize,
    /// Whether semantic refinement was requested but fell back.
    pub refinement_degraded: bool,
}

/// The chunks produced for one transcript plus their accounting.
#[derive(Debug)]
pub struct ChunkingOutcome {
    pub chunks: Vec<Chunk>,
    pub report: ChunkingReport,
}

impl ChunkingOutcome {
    fn empty() -> Self {
        Self {
            chunks: Vec::new(),
            report: ChunkingReport::default(),
        }
    }
}

/// Adaptive chunking pipeline for one transcript at a time.
///
/// A pure function of its inputs plus the injected tokenizer and embedder;
/// no ambient state. Processing different transcripts shares nothing
/// mutable, so callers may run pipelines concurrently across transcripts.
pub struct ChunkingPipeline {
    options: ChunkingOptions,
    counter: SharedTokenCounter,
    normalizer: Normalizer,
    splitter: RecursiveSplitter,
    enforcer: SizeEnforcer,
    hierarchy: HierarchyBuilder,
    refiner: Option<SemanticRefiner>,
}

impl ChunkingPipeline {
    /// Construct a pipeline, rejecting invalid options up front.
    ///
    /// An embedder is required when semantic refinement is enabled; the
    /// mismatch is a construction-time error, not a runtime surprise.
    pub fn new(
        options: ChunkingOptions,
        counter: SharedTokenCounter,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> Result<Self> {
        options.validate()?;

        let refiner = match (options.use_semantic_refinement, embedder) {
            (true, Some(embedder)) => Some(SemanticRefiner::new(
                embedder,
                options.breakpoint_percentile,
            )),
            (true, None) => {
                return Err(PlaybookError::Config(
                    "semantic refinement requires an embedder".to_string(),
                ))
            }
            (false, _) => None,
        };

        let splitter = RecursiveSplitter::new(
            counter.clone(),
            options.max_chunk_size,
            options.chunk_overlap,
        );
        let enforcer = SizeEnforcer::new(
            counter.clone(),
            options.min_chunk_size,
            options.max_chunk_size,
        );
        let hierarchy = HierarchyBuilder::new(counter.clone(), options.parent_chunk_size);

        Ok(Self {
            options,
            counter,
            normalizer: Normalizer::new(),
            splitter,
            enforcer,
            hierarchy,
            refiner,
        })
    }

    /// Options the pipeline was constructed with.
    pub fn options(&self) -> &ChunkingOptions {
        &self.options
    }

    /// Process one transcript into retrieval units.
    ///
    /// Malformed or empty transcript text yields zero chunks, never an
    /// error; a batch caller just moves on to the next transcript.
    #[instrument(skip(self, record), fields(video_id = %record.id))]
    pub async fn process(&self, record: &TranscriptRecord) -> ChunkingOutcome {
        let normalized = self.normalizer.normalize(&record.raw_text);
        if normalized.is_empty() {
            warn!("transcript normalized to empty text, emitting no chunks");
            return ChunkingOutcome::empty();
        }

        let candidates = self.splitter.split(&normalized);
        let base = self.enforcer.enforce(candidates, &self.splitter);

        let mut texts = base.chunks;
        let mut dropped = base.dropped;
        let mut kind = ChunkKind::Recursive;
        let mut degraded = false;

        if let Some(refiner) = &self.refiner {
            if texts.is_empty() {
                debug!("skipping refinement, no chunks survived enforcement");
            } else {
                match refiner.refine(&normalized).await {
                    Refinement::Refined(segments) => {
                        // Semantic boundaries may violate size bounds, so the
                        // refined segments go back through the enforcer.
                        let refined = self.enforcer.enforce(segments, &self.splitter);
                        if refined.chunks.is_empty() {
                            warn!("refinement left no valid chunks, keeping recursive chunks");
                            degraded = true;
                        } else {
                            texts = refined.chunks;
                            dropped = refined.dropped;
                            kind = ChunkKind::Semantic;
                        }
                    }
                    Refinement::Degraded { reason } => {
                        warn!(%reason, "semantic refinement degraded, keeping recursive chunks");
                        degraded = true;
                    }
                }
            }
        }

        let source = SourceInfo::from_record(record);
        let chunks = if self.options.use_hierarchy && !texts.is_empty() {
            self.assemble_hierarchy(&normalized, texts, &source)
        } else {
            self.assemble_flat(texts, kind, &source)
        };

        info!(
            chunks = chunks.len(),
            dropped, degraded, "chunked transcript"
        );

        ChunkingOutcome {
            report: ChunkingReport {
                chunks_emitted: chunks.len(),
                chunks_dropped: dropped,
                refinement_degraded: degraded,
            },
            chunks,
        }
    }

    /// Assemble a flat chunk sequence, recomputing token counts rather than
    /// trusting upstream stages.
    fn assemble_flat(&self, texts: Vec<String>, kind: ChunkKind, source: &SourceInfo) -> Vec<Chunk> {
        let total = texts.len();
        texts
            .into_iter()
            .enumerate()
            .map(|(index, content)| Chunk {
                id: uuid::Uuid::new_v4().to_string(),
                token_count: self.counter.count(&content),
                content,
                index,
                total_chunks: total,
                kind,
                parent_id: None,
                source: source.clone(),
            })
            .collect()
    }

    /// Assemble children with parent linkage, then the parent spans
    /// themselves. Parents are exempt from the child size bounds.
    fn assemble_hierarchy(
        &self,
        normalized: &str,
        texts: Vec<String>,
        source: &SourceInfo,
    ) -> Vec<Chunk> {
        let (parents, assignment) = self.hierarchy.build(normalized, &texts);

        let total_children = texts.len();
        let mut chunks: Vec<Chunk> = texts
            .into_iter()
            .enumerate()
            .map(|(index, content)| Chunk {
                id: uuid::Uuid::new_v4().to_string(),
                token_count: self.counter.count(&content),
                content,
                index,
                total_chunks: total_children,
                kind: ChunkKind::Child,
                parent_id: assignment
                    .get(index)
                    .and_then(|&p| parents.get(p))
                    .map(|p| p.id.clone()),
                source: source.clone(),
            })
            .collect();

        let total_parents = parents.len();
        chunks.extend(parents.into_iter().enumerate().map(|(j, parent)| Chunk {
            // The parent keeps the ID its children reference.
            id: parent.id,
            token_count: self.counter.count(&parent.content),
            content: parent.content,
            index: total_children + j,
            total_chunks: total_parents,
            kind: ChunkKind::Parent,
            parent_id: None,
            source: source.clone(),
        }));

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::testing::WordCounter;
    use async_trait::async_trait;
    use std::collections::HashSet;

    fn record(text: &str) -> TranscriptRecord {
        TranscriptRecord {
            id: "vid1".to_string(),
            raw_text: text.to_string(),
            title: "How to Scale".to_string(),
            source_url: "https://youtube.com/watch?v=vid1".to_string(),
            published_at: None,
            summary: None,
            topics: vec![],
        }
    }

    fn options(min: usize, max: usize, overlap: usize) -> ChunkingOptions {
        ChunkingOptions {
            max_chunk_size: max,
            min_chunk_size: min,
            chunk_overlap: overlap,
            ..Default::default()
        }
    }

    fn pipeline(options: ChunkingOptions) -> ChunkingPipeline {
        ChunkingPipeline::new(options, Arc::new(WordCounter), None).unwrap()
    }

    /// Embedder that fails on every call, for the fallback property.
    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(PlaybookError::Embedding("down".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(PlaybookError::Embedding("down".to_string()))
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn size_invariant_holds_for_every_emitted_chunk() {
        // 2000 distinct words in one giant run with no sentence or paragraph
        // boundaries. Word-level splitting must suffice.
        let text = (1..=2000).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let pipeline = pipeline(options(150, 400, 50));

        let outcome = pipeline.process(&record(&text)).await;

        assert!(outcome.chunks.len() > 1);
        for chunk in &outcome.chunks {
            assert!(
                (150..=400).contains(&chunk.token_count),
                "chunk {} out of bounds: {}",
                chunk.index,
                chunk.token_count
            );
        }
    }

    #[tokio::test]
    async fn chunk_content_is_contained_in_normalized_text() {
        let text = (1..=500).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let pipeline = pipeline(options(10, 50, 5));

        let normalized = Normalizer::new().normalize(&text);
        let outcome = pipeline.process(&record(&text)).await;

        assert!(!outcome.chunks.is_empty());
        for chunk in &outcome.chunks {
            assert!(normalized.contains(&chunk.content));
        }
    }

    #[tokio::test]
    async fn undersized_transcript_yields_zero_chunks_with_drop_count() {
        // 80 tokens against a 150-token minimum: dropped, not an error.
        let text = (1..=80).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let pipeline = pipeline(options(150, 400, 50));

        let outcome = pipeline.process(&record(&text)).await;

        assert!(outcome.chunks.is_empty());
        assert_eq!(outcome.report.chunks_dropped, 1);
        assert_eq!(outcome.report.chunks_emitted, 0);
    }

    #[tokio::test]
    async fn empty_transcript_yields_zero_chunks() {
        let pipeline = pipeline(options(10, 50, 5));
        let outcome = pipeline.process(&record("   ")).await;

        assert!(outcome.chunks.is_empty());
        assert_eq!(outcome.report.chunks_dropped, 0);
    }

    #[tokio::test]
    async fn indices_are_sequential_and_unique() {
        let text = (1..=300).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let pipeline = pipeline(options(10, 50, 0));

        let outcome = pipeline.process(&record(&text)).await;
        let indices: Vec<usize> = outcome.chunks.iter().map(|c| c.index).collect();
        let expected: Vec<usize> = (0..outcome.chunks.len()).collect();
        assert_eq!(indices, expected);
    }

    #[tokio::test]
    async fn refinement_failure_falls_back_to_recursive_chunks() {
        let text = (1..=300).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");

        let baseline = pipeline(options(10, 50, 0));
        let baseline_chunks: Vec<String> = baseline
            .process(&record(&text))
            .await
            .chunks
            .into_iter()
            .map(|c| c.content)
            .collect();

        let mut opts = options(10, 50, 0);
        opts.use_semantic_refinement = true;
        let refined = ChunkingPipeline::new(opts, Arc::new(WordCounter), Some(Arc::new(FailingEmbedder)))
            .unwrap();
        let outcome = refined.process(&record(&text)).await;

        let contents: Vec<String> = outcome.chunks.iter().map(|c| c.content.clone()).collect();
        assert_eq!(contents, baseline_chunks);
        assert!(outcome.report.refinement_degraded);
        assert!(outcome
            .chunks
            .iter()
            .all(|c| c.kind == ChunkKind::Recursive));
    }

    #[tokio::test]
    async fn refinement_requires_an_embedder_at_construction() {
        let mut opts = options(10, 50, 0);
        opts.use_semantic_refinement = true;
        assert!(ChunkingPipeline::new(opts, Arc::new(WordCounter), None).is_err());
    }

    #[tokio::test]
    async fn hierarchy_links_every_child_to_an_existing_parent() {
        let text = (1..=1000).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");

        let mut opts = options(10, 100, 0);
        opts.use_hierarchy = true;
        opts.parent_chunk_size = 200;
        let pipeline = pipeline(opts);

        let outcome = pipeline.process(&record(&text)).await;

        let parent_ids: HashSet<&String> = outcome
            .chunks
            .iter()
            .filter(|c| c.kind == ChunkKind::Parent)
            .map(|c| &c.id)
            .collect();
        assert!(!parent_ids.is_empty());

        // Parents are exempt from the child size bounds and carry no parent
        // link themselves.
        for parent in outcome.chunks.iter().filter(|c| c.kind == ChunkKind::Parent) {
            assert!(parent.token_count > 100);
            assert!(parent.parent_id.is_none());
        }

        let children: Vec<&Chunk> = outcome
            .chunks
            .iter()
            .filter(|c| c.kind == ChunkKind::Child)
            .collect();
        assert!(!children.is_empty());

        for child in &children {
            let pid = child.parent_id.as_ref().expect("child missing parent_id");
            assert!(parent_ids.contains(pid), "dangling parent id {}", pid);

            // The linked parent's span contains the child's content.
            let parent = outcome
                .chunks
                .iter()
                .find(|c| c.kind == ChunkKind::Parent && &c.id == pid)
                .unwrap();
            assert!(parent.content.contains(&child.content));
        }
    }
}
