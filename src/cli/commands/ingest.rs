//! Ingest command - batch chunking, embedding, and indexing.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(limit: Option<usize>, force: bool, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Chunking and indexing transcripts...");
    let report = orchestrator.index_batch(limit, force).await;
    spinner.finish_and_clear();

    match report {
        Ok(report) => {
            Output::success(&format!(
                "Indexed {} of {} transcripts",
                report.transcripts_indexed, report.transcripts_in
            ));
            Output::kv("Chunks indexed", &report.chunks_indexed.to_string());
            Output::kv("Chunks dropped", &report.chunks_dropped.to_string());
            if report.transcripts_skipped > 0 {
                Output::kv(
                    "Skipped (already indexed)",
                    &report.transcripts_skipped.to_string(),
                );
            }
            if report.transcripts_failed > 0 {
                Output::warning(&format!(
                    "{} transcript(s) failed; see logs for details",
                    report.transcripts_failed
                ));
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Ingest failed: {}", e));
            Err(e.into())
        }
    }
}
