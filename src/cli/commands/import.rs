//! Import command - load a transcript JSON export into the warehouse.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::PlaybookError;
use crate::transcript::{SqliteWarehouse, TranscriptRecord};
use anyhow::Result;
use std::path::Path;

/// Run the import command.
pub fn run_import(file: &str, settings: &Settings) -> Result<()> {
    let path = Path::new(file);
    let content = std::fs::read_to_string(path)
        .map_err(|e| PlaybookError::TranscriptSource(format!("failed to read {}: {}", file, e)))?;

    let records: Vec<TranscriptRecord> = serde_json::from_str(&content)
        .map_err(|e| PlaybookError::TranscriptSource(format!("failed to parse {}: {}", file, e)))?;

    if records.is_empty() {
        Output::warning("No transcript records found in file.");
        return Ok(());
    }

    let warehouse = SqliteWarehouse::open(
        &settings.warehouse_path(),
        settings.source.min_transcript_chars,
    )?;

    let mut imported = 0;
    let mut skipped = 0;
    for record in &records {
        if record.raw_text.trim().is_empty() {
            skipped += 1;
            continue;
        }
        warehouse.upsert(record)?;
        imported += 1;
    }

    Output::success(&format!(
        "Imported {} transcripts into {}",
        imported,
        settings.warehouse_path().display()
    ));
    if skipped > 0 {
        Output::warning(&format!("Skipped {} records with empty text", skipped));
    }
    Output::info("Run 'playbook ingest' to chunk and index them.");

    Ok(())
}
