//! Retrieval quality metrics computed locally.
//!
//! Precision@k and recall@k against the dataset's ground-truth chunks. A
//! retrieved chunk counts as relevant when its text and a ground-truth
//! chunk's text contain one another; chunk boundaries rarely line up
//! exactly across chunking configurations, so exact equality would score
//! every configuration at zero.

use super::dataset::EvalChunk;

/// Aggregated retrieval metrics over a question set.
#[derive(Debug, Clone, Default)]
pub struct RetrievalMetrics {
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub k: usize,
}

/// Per-metric summary statistics, mirroring what the answer judge reports.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    /// Summarize a sample; empty samples yield all zeros.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        Self {
            mean,
            std: variance.sqrt(),
            min,
            max,
        }
    }
}

/// Whether a retrieved chunk text matches a ground-truth chunk.
fn matches(retrieved: &str, truth: &EvalChunk) -> bool {
    let retrieved = retrieved.trim();
    let truth_text = truth.text.trim();
    if retrieved.is_empty() || truth_text.is_empty() {
        return false;
    }
    retrieved.contains(truth_text) || truth_text.contains(retrieved)
}

/// Compute precision@k and recall@k for one question.
///
/// Precision: fraction of the retrieved chunks that match some ground-truth
/// chunk. Recall: fraction of the ground-truth chunks covered by some
/// retrieved chunk.
pub fn precision_recall_at_k(
    retrieved: &[String],
    ground_truth: &[EvalChunk],
    k: usize,
) -> (f64, f64) {
    let considered = &retrieved[..retrieved.len().min(k)];

    let precision = if considered.is_empty() {
        0.0
    } else {
        let relevant = considered
            .iter()
            .filter(|r| ground_truth.iter().any(|t| matches(r, t)))
            .count();
        relevant as f64 / considered.len() as f64
    };

    let recall = if ground_truth.is_empty() {
        0.0
    } else {
        let covered = ground_truth
            .iter()
            .filter(|t| considered.iter().any(|r| matches(r, t)))
            .count();
        covered as f64 / ground_truth.len() as f64
    };

    (precision, recall)
}

/// Aggregate per-question precision/recall samples into batch metrics.
pub fn aggregate_retrieval(samples: &[(f64, f64)], k: usize) -> RetrievalMetrics {
    if samples.is_empty() {
        return RetrievalMetrics {
            k,
            ..Default::default()
        };
    }

    let n = samples.len() as f64;
    RetrievalMetrics {
        precision_at_k: samples.iter().map(|(p, _)| p).sum::<f64>() / n,
        recall_at_k: samples.iter().map(|(_, r)| r).sum::<f64>() / n,
        k,
    }
}
