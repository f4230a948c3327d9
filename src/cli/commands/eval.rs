//! Eval command - chunking parameter grid search with a markdown report.

use crate::chunking::ChunkingOptions;
use crate::cli::Output;
use crate::config::Settings;
use crate::eval::{default_grid, write_report, EvalDataset, EvalHarness, LlmAnswerer, LlmJudge};
use crate::orchestrator::Orchestrator;
use crate::tokenizer::TiktokenCounter;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Run the eval command.
pub async fn run_eval(
    dataset_path: Option<String>,
    report_path: Option<String>,
    offline: bool,
    settings: Settings,
) -> Result<()> {
    let dataset_path = dataset_path.unwrap_or_else(|| settings.eval.dataset_path.clone());
    let report_path = report_path.unwrap_or_else(|| settings.eval.report_path.clone());

    let dataset = EvalDataset::load(Path::new(&dataset_path))?;
    Output::info(&format!(
        "Loaded {} questions covering {} videos",
        dataset.questions.len(),
        dataset.video_ids().len()
    ));

    let orchestrator = Orchestrator::new(settings.clone())?;
    let counter = Arc::new(TiktokenCounter::with_encoding(&settings.chunking.encoding)?);

    let mut harness = EvalHarness::new(
        orchestrator.source(),
        orchestrator.embedder(),
        counter,
        ChunkingOptions::from(&settings.chunking),
        settings.eval.top_k,
    );

    if offline {
        Output::info("Offline mode: retrieval metrics only.");
    } else {
        harness = harness.with_answer_judge(
            Arc::new(LlmAnswerer::new(&settings.rag.model)),
            Arc::new(LlmJudge::new(&settings.eval.judge_model)),
        );
    }

    let grid = default_grid();
    Output::info(&format!("Running grid search over {} configurations", grid.len()));

    let spinner = Output::spinner("Evaluating...");
    let results = harness.run(&dataset, &grid).await;
    spinner.finish_and_clear();

    let results = results?;
    for result in &results {
        Output::kv(
            &format!(
                "max={} min={} overlap={}",
                result.params.max_chunk_size, result.params.min_chunk_size, result.params.chunk_overlap
            ),
            &format!(
                "{} chunks, precision@{}={:.3}, recall@{}={:.3}",
                result.num_chunks,
                result.retrieval.k,
                result.retrieval.precision_at_k,
                result.retrieval.k,
                result.retrieval.recall_at_k
            ),
        );
    }

    write_report(Path::new(&report_path), &results)?;
    Output::success(&format!("Report written to {}", report_path));

    Ok(())
}
