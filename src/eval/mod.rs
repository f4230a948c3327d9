//! Evaluation harness for retrieval and answer quality.
//!
//! Runs a grid search over chunking parameters: for each configuration the
//! dataset's transcripts are re-chunked into a temporary in-memory index,
//! every question is retrieved against it, and retrieval metrics are
//! computed locally. Answer metrics are delegated to LLM collaborators when
//! enabled.

mod dataset;
mod judge;
mod metrics;
mod report;

pub use dataset::{EvalChunk, EvalDataset, EvalQuestion};
pub use judge::{AnswerGenerator, AnswerJudge, AnswerScores, LlmAnswerer, LlmJudge};
pub use metrics::{RetrievalMetrics, Stats};
pub use report::write_report;

use crate::chunking::{ChunkingOptions, ChunkingPipeline};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::rag::ContextChunk;
use crate::tokenizer::SharedTokenCounter;
use crate::transcript::TranscriptSource;
use crate::vector_store::{Document, MemoryVectorStore, VectorStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One point in the chunking parameter grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPoint {
    pub max_chunk_size: usize,
    pub min_chunk_size: usize,
    pub chunk_overlap: usize,
}

impl GridPoint {
    pub fn new(max_chunk_size: usize, min_chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            max_chunk_size,
            min_chunk_size,
            chunk_overlap,
        }
    }
}

/// The default three-point grid around the production configuration.
pub fn default_grid() -> Vec<GridPoint> {
    vec![
        GridPoint::new(300, 100, 30),
        GridPoint::new(400, 150, 50),
        GridPoint::new(500, 200, 75),
    ]
}

/// Metrics for one grid configuration.
#[derive(Debug, Clone)]
pub struct EvalConfigResult {
    pub params: GridPoint,
    pub num_chunks: usize,
    pub chunks_dropped: usize,
    pub avg_chunk_tokens: f64,
    pub retrieval: RetrievalMetrics,
    pub relevancy: Option<Stats>,
    pub faithfulness: Option<Stats>,
}

/// Pick the configuration with the best combined score.
///
/// Prefers answer metrics when they were computed, otherwise balances
/// retrieval precision and recall.
pub fn best_result(results: &[EvalConfigResult]) -> Option<&EvalConfigResult> {
    results.iter().max_by(|a, b| {
        score(a)
            .partial_cmp(&score(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

fn score(result: &EvalConfigResult) -> f64 {
    match (&result.relevancy, &result.faithfulness) {
        (Some(r), Some(f)) => (r.mean + f.mean) / 2.0,
        _ => (result.retrieval.precision_at_k + result.retrieval.recall_at_k) / 2.0,
    }
}

/// Grid-search evaluation harness.
pub struct EvalHarness {
    source: Arc<dyn TranscriptSource>,
    embedder: Arc<dyn Embedder>,
    counter: SharedTokenCounter,
    base_options: ChunkingOptions,
    top_k: usize,
    answerer: Option<Arc<dyn AnswerGenerator>>,
    judge: Option<Arc<dyn AnswerJudge>>,
}

impl EvalHarness {
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        embedder: Arc<dyn Embedder>,
        counter: SharedTokenCounter,
        base_options: ChunkingOptions,
        top_k: usize,
    ) -> Self {
        Self {
            source,
            embedder,
            counter,
            base_options,
            top_k,
            answerer: None,
            judge: None,
        }
    }

    /// Enable answer generation and judging.
    pub fn with_answer_judge(
        mut self,
        answerer: Arc<dyn AnswerGenerator>,
        judge: Arc<dyn AnswerJudge>,
    ) -> Self {
        self.answerer = Some(answerer);
        self.judge = Some(judge);
        self
    }

    /// Run the grid search over the evaluation dataset.
    #[instrument(skip(self, dataset, grid))]
    pub async fn run(
        &self,
        dataset: &EvalDataset,
        grid: &[GridPoint],
    ) -> Result<Vec<EvalConfigResult>> {
        // Fetch the transcripts the dataset's ground truth refers to.
        let mut transcripts = Vec::new();
        for video_id in dataset.video_ids() {
            match self.source.fetch_by_id(&video_id).await? {
                Some(record) => transcripts.push(record),
                None => warn!(video_id = %video_id, "dataset references a transcript missing from the source"),
            }
        }

        info!(
            transcripts = transcripts.len(),
            questions = dataset.questions.len(),
            configurations = grid.len(),
            "starting evaluation grid search"
        );

        let mut results = Vec::with_capacity(grid.len());
        for point in grid {
            results.push(self.evaluate_point(dataset, &transcripts, *point).await?);
        }

        Ok(results)
    }

    async fn evaluate_point(
        &self,
        dataset: &EvalDataset,
        transcripts: &[crate::transcript::TranscriptRecord],
        point: GridPoint,
    ) -> Result<EvalConfigResult> {
        info!(
            max = point.max_chunk_size,
            min = point.min_chunk_size,
            overlap = point.chunk_overlap,
            "evaluating configuration"
        );

        // Refinement and hierarchy stay off during grid search; they are
        // orthogonal to the size parameters under test and slow it down.
        let options = ChunkingOptions {
            max_chunk_size: point.max_chunk_size,
            min_chunk_size: point.min_chunk_size,
            chunk_overlap: point.chunk_overlap,
            use_semantic_refinement: false,
            use_hierarchy: false,
            ..self.base_options.clone()
        };
        let pipeline = ChunkingPipeline::new(options, self.counter.clone(), None)?;

        // Build a throwaway index for this configuration.
        let store = MemoryVectorStore::new();
        let mut num_chunks = 0;
        let mut chunks_dropped = 0;
        let mut token_total = 0usize;

        for record in transcripts {
            let outcome = pipeline.process(record).await;
            chunks_dropped += outcome.report.chunks_dropped;

            if outcome.chunks.is_empty() {
                continue;
            }

            let texts: Vec<String> = outcome.chunks.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            let documents: Vec<Document> = outcome
                .chunks
                .iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| Document::from_chunk(chunk, embedding))
                .collect();

            num_chunks += documents.len();
            token_total += outcome.chunks.iter().map(|c| c.token_count).sum::<usize>();
            store.upsert_batch(&documents).await?;
        }

        // Retrieve per question and score.
        let mut retrieval_samples = Vec::new();
        let mut relevancy_samples = Vec::new();
        let mut faithfulness_samples = Vec::new();

        for question in &dataset.questions {
            let query_embedding = self.embedder.embed(&question.question).await?;
            let hits = store.search(&query_embedding, self.top_k).await?;

            let retrieved: Vec<String> =
                hits.iter().map(|h| h.document.content.clone()).collect();
            retrieval_samples.push(metrics::precision_recall_at_k(
                &retrieved,
                &question.relevant_chunks,
                self.top_k,
            ));

            if let (Some(answerer), Some(judge)) = (&self.answerer, &self.judge) {
                let context = hits
                    .iter()
                    .map(|h| ContextChunk::from(h.clone()))
                    .map(|c| format!("Source: {} | Chunk: {}\nContent: {}", c.video_title, c.chunk_id, c.content))
                    .collect::<Vec<_>>()
                    .join("\n\n");

                match self
                    .answer_and_judge(answerer, judge, &question.question, &context)
                    .await
                {
                    Ok(scores) => {
                        relevancy_samples.push(scores.relevancy);
                        faithfulness_samples.push(scores.faithfulness);
                    }
                    Err(e) => {
                        warn!(error = %e, "answer judging failed for a question, skipping it");
                    }
                }
            }
        }

        let avg_chunk_tokens = if num_chunks > 0 {
            token_total as f64 / num_chunks as f64
        } else {
            0.0
        };

        Ok(EvalConfigResult {
            params: point,
            num_chunks,
            chunks_dropped,
            avg_chunk_tokens,
            retrieval: metrics::aggregate_retrieval(&retrieval_samples, self.top_k),
            relevancy: (!relevancy_samples.is_empty())
                .then(|| Stats::from_samples(&relevancy_samples)),
            faithfulness: (!faithfulness_samples.is_empty())
                .then(|| Stats::from_samples(&faithfulness_samples)),
        })
    }

    async fn answer_and_judge(
        &self,
        answerer: &Arc<dyn AnswerGenerator>,
        judge: &Arc<dyn AnswerJudge>,
        question: &str,
        context: &str,
    ) -> Result<AnswerScores> {
        let answer = answerer.generate(question, context).await?;
        judge.judge(question, &answer, context).await
    }
}
