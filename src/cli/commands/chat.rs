//! Chat command - interactive session over the transcript library.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::orchestrator::Orchestrator;
use crate::rag::RagEngine;
use anyhow::Result;
use console::style;
use std::io::{self, Write};

/// Run the chat command.
pub async fn run_chat(model: Option<String>, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings.clone())?;

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let model = model.unwrap_or_else(|| settings.rag.model.clone());
    let mut engine = RagEngine::new(
        orchestrator.vector_store(),
        orchestrator.embedder(),
        &model,
        settings.rag.max_context_chunks,
        settings.rag.min_score,
    )
    .with_prompts(prompts);

    Output::header("Playbook Chat");
    println!();
    Output::info("Ask about your transcript library. Type 'exit' to quit, 'clear' to reset.");
    println!();

    loop {
        print!("{} ", style("you>").cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        match input {
            "" => continue,
            "exit" | "quit" => break,
            "clear" => {
                engine.clear_history();
                Output::info("Conversation cleared.");
                continue;
            }
            _ => {}
        }

        let spinner = Output::spinner("Thinking...");
        let response = engine.chat(input).await;
        spinner.finish_and_clear();

        match response {
            Ok(response) => {
                println!("{} {}", style("playbook>").green().bold(), response.answer);
                if !response.sources.is_empty() {
                    let titles: Vec<&str> = response
                        .sources
                        .iter()
                        .map(|s| s.video_title.as_str())
                        .collect();
                    println!("  {}", style(format!("sources: {}", titles.join(", "))).dim());
                }
                println!();
            }
            Err(e) => Output::error(&format!("{}", e)),
        }
    }

    Ok(())
}
