//! Rechunk command - re-chunk indexed transcripts with current settings.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the rechunk command.
pub async fn run_rechunk(video_id: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let targets: Vec<String> = if video_id == "all" {
        orchestrator
            .vector_store()
            .list_transcripts()
            .await?
            .into_iter()
            .map(|t| t.video_id)
            .collect()
    } else {
        vec![video_id.to_string()]
    };

    if targets.is_empty() {
        Output::info("Nothing to rechunk.");
        return Ok(());
    }

    let mut failures = 0;
    for target in &targets {
        let spinner = Output::spinner(&format!("Rechunking {}...", target));
        let outcome = orchestrator.rechunk(target).await;
        spinner.finish_and_clear();

        match outcome {
            Ok(outcome) => {
                Output::success(&format!(
                    "{}: {} chunks indexed, {} dropped",
                    outcome.title, outcome.chunks_indexed, outcome.chunks_dropped
                ));
            }
            Err(e) => {
                Output::error(&format!("{}: {}", target, e));
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} transcript(s) failed to rechunk", failures);
    }
    Ok(())
}
