//! Ask command implementation.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::orchestrator::Orchestrator;
use crate::rag::RagEngine;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    max_chunks: usize,
    settings: Settings,
) -> Result<()> {
    let orchestrator = Orchestrator::new(settings.clone())?;

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let model = model.unwrap_or_else(|| settings.rag.model.clone());
    let engine = RagEngine::new(
        orchestrator.vector_store(),
        orchestrator.embedder(),
        &model,
        max_chunks,
        settings.rag.min_score,
    )
    .with_prompts(prompts);

    let spinner = Output::spinner("Thinking...");
    let response = engine.ask(question).await;
    spinner.finish_and_clear();

    match response {
        Ok(response) => {
            println!("{}", response.format_for_display());
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to answer: {}", e));
            Err(e.into())
        }
    }
}
