//! Markdown report generation for evaluation runs.

use super::{best_result, EvalConfigResult};
use crate::error::Result;
use std::path::Path;
use tracing::info;

/// Write the grid-search results as a markdown report.
pub fn write_report(path: &Path, results: &[EvalConfigResult]) -> Result<()> {
    let mut out = String::new();
    out.push_str("# RAG Evaluation Report\n\n");
    out.push_str("## Grid Search Results\n\n");

    for result in results {
        out.push_str(&format!(
            "### max={} min={} overlap={}\n\n",
            result.params.max_chunk_size, result.params.min_chunk_size, result.params.chunk_overlap
        ));
        out.push_str(&format!("- chunks: {}\n", result.num_chunks));
        out.push_str(&format!("- chunks dropped: {}\n", result.chunks_dropped));
        out.push_str(&format!(
            "- avg chunk tokens: {:.1}\n",
            result.avg_chunk_tokens
        ));
        out.push_str(&format!(
            "- precision@{}: {:.3}\n",
            result.retrieval.k, result.retrieval.precision_at_k
        ));
        out.push_str(&format!(
            "- recall@{}: {:.3}\n",
            result.retrieval.k, result.retrieval.recall_at_k
        ));

        if let Some(relevancy) = &result.relevancy {
            out.push_str(&format!(
                "- answer relevancy: mean {:.3}, std {:.3}, min {:.3}, max {:.3}\n",
                relevancy.mean, relevancy.std, relevancy.min, relevancy.max
            ));
        }
        if let Some(faithfulness) = &result.faithfulness {
            out.push_str(&format!(
                "- faithfulness: mean {:.3}, std {:.3}, min {:.3}, max {:.3}\n",
                faithfulness.mean, faithfulness.std, faithfulness.min, faithfulness.max
            ));
        }
        out.push('\n');
    }

    if let Some(best) = best_result(results) {
        out.push_str("## Recommended Configuration\n\n");
        out.push_str(&format!(
            "max_chunk_size={} min_chunk_size={} chunk_overlap={}\n",
            best.params.max_chunk_size, best.params.min_chunk_size, best.params.chunk_overlap
        ));
    }

    std::fs::write(path, out)?;
    info!("Evaluation report written to {}", path.display());
    Ok(())
}
