//! Doctor command - health checks for configuration and storage.

use crate::cli::Output;
use crate::config::Settings;
use crate::tokenizer::TiktokenCounter;
use crate::transcript::{SqliteWarehouse, TranscriptSource};
use crate::vector_store::{SqliteVectorStore, VectorStore};
use console::style;

/// Run the doctor command.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Playbook Doctor");
    println!();

    let mut problems = 0;

    // Configuration
    match settings.validate() {
        Ok(()) => check_ok("Configuration is valid"),
        Err(e) => {
            check_failed(&format!("Configuration invalid: {}", e));
            problems += 1;
        }
    }

    // API key
    if std::env::var("OPENAI_API_KEY").is_ok() {
        check_ok("OPENAI_API_KEY is set");
    } else {
        check_failed("OPENAI_API_KEY is not set");
        problems += 1;
    }

    // Tokenizer encoding
    match TiktokenCounter::with_encoding(&settings.chunking.encoding) {
        Ok(_) => check_ok(&format!(
            "Tokenizer encoding '{}' loads",
            settings.chunking.encoding
        )),
        Err(e) => {
            check_failed(&format!("Tokenizer failed to load: {}", e));
            problems += 1;
        }
    }

    // Transcript warehouse
    match SqliteWarehouse::open(
        &settings.warehouse_path(),
        settings.source.min_transcript_chars,
    ) {
        Ok(warehouse) => match warehouse.fetch(1).await {
            Ok(records) => check_ok(&format!(
                "Transcript warehouse reachable ({})",
                if records.is_empty() {
                    "empty".to_string()
                } else {
                    "has transcripts".to_string()
                }
            )),
            Err(e) => {
                check_failed(&format!("Warehouse query failed: {}", e));
                problems += 1;
            }
        },
        Err(e) => {
            check_failed(&format!("Warehouse unreachable: {}", e));
            problems += 1;
        }
    }

    // Vector store
    match SqliteVectorStore::new(&settings.sqlite_path()) {
        Ok(store) => match store.document_count().await {
            Ok(count) => check_ok(&format!("Vector store reachable ({} documents)", count)),
            Err(e) => {
                check_failed(&format!("Vector store query failed: {}", e));
                problems += 1;
            }
        },
        Err(e) => {
            check_failed(&format!("Vector store unreachable: {}", e));
            problems += 1;
        }
    }

    println!();
    if problems == 0 {
        Output::success("All checks passed.");
    } else {
        Output::warning(&format!("{} problem(s) found.", problems));
    }

    Ok(())
}

fn check_ok(msg: &str) {
    println!("  {} {}", style("✓").green(), msg);
}

fn check_failed(msg: &str) {
    println!("  {} {}", style("✗").red(), msg);
}
