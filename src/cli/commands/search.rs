//! Search command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::ContextBuilder;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: usize,
    min_score: f32,
    settings: Settings,
) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let context_builder =
        ContextBuilder::new(orchestrator.vector_store(), orchestrator.embedder())
            .with_max_chunks(limit)
            .with_min_score(min_score);

    let spinner = Output::spinner("Searching...");
    let results = context_builder.build(query).await;
    spinner.finish_and_clear();

    match results {
        Ok(bundle) => {
            if bundle.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", bundle.chunks.len()));

                for chunk in &bundle.chunks {
                    Output::search_result(
                        &chunk.video_title,
                        chunk.score,
                        &chunk.content,
                        &chunk.source_url,
                    );
                }
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            Err(e.into())
        }
    }
}
