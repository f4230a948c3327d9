//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    match orchestrator.vector_store().list_transcripts().await {
        Ok(transcripts) => {
            if transcripts.is_empty() {
                Output::info("No transcripts indexed yet. Use 'playbook ingest' to add content.");
            } else {
                Output::header(&format!("Indexed Transcripts ({})", transcripts.len()));
                println!();

                for item in &transcripts {
                    Output::transcript_info(&item.video_title, &item.video_id, item.chunk_count);
                }

                let total_chunks: u32 = transcripts.iter().map(|t| t.chunk_count).sum();
                println!();
                Output::kv("Total transcripts", &transcripts.len().to_string());
                Output::kv("Total chunks", &total_chunks.to_string());
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to list transcripts: {}", e));
            Err(e.into())
        }
    }
}
