//! Embedding-distance semantic refinement.
//!
//! Re-segments a document at topical discontinuities instead of fixed
//! separators: adjacent sentences are embedded, and a boundary is cut
//! wherever the embedding distance exceeds a percentile threshold of the
//! distances observed in that document.

use crate::embedding::{cosine_similarity, Embedder};
use std::sync::Arc;
use tracing::debug;

/// Outcome of a refinement attempt.
///
/// Refinement is a best-effort enhancement: any failure is reported as a
/// typed `Degraded` variant for the caller to log and fall back on, never an
/// error that aborts the pipeline.
#[derive(Debug)]
pub enum Refinement {
    /// Topically segmented spans, ready for size enforcement.
    Refined(Vec<String>),
    /// Refinement could not run; the caller keeps its pre-refinement chunks.
    Degraded { reason: String },
}

/// Re-segments text at embedding-distance discontinuities.
pub struct SemanticRefiner {
    embedder: Arc<dyn Embedder>,
    breakpoint_percentile: f64,
}

impl SemanticRefiner {
    pub fn new(embedder: Arc<dyn Embedder>, breakpoint_percentile: f64) -> Self {
        Self {
            embedder,
            breakpoint_percentile,
        }
    }

    /// Attempt to re-segment the normalized document text.
    ///
    /// Output spans are contiguous substrings of the input; their
    /// concatenation reconstructs it exactly.
    pub async fn refine(&self, text: &str) -> Refinement {
        let sentences = split_sentences(text);
        if sentences.len() < 3 {
            return Refinement::Degraded {
                reason: format!("only {} sentences, nothing to re-segment", sentences.len()),
            };
        }

        let inputs: Vec<String> = sentences.iter().map(|s| s.trim().to_string()).collect();
        let embeddings = match self.embedder.embed_batch(&inputs).await {
            Ok(embeddings) => embeddings,
            Err(e) => {
                return Refinement::Degraded {
                    reason: format!("embedding call failed: {}", e),
                }
            }
        };

        if embeddings.len() != sentences.len() {
            return Refinement::Degraded {
                reason: format!(
                    "embedding count mismatch: {} sentences, {} vectors",
                    sentences.len(),
                    embeddings.len()
                ),
            };
        }

        let distances: Vec<f32> = embeddings
            .windows(2)
            .map(|pair| 1.0 - cosine_similarity(&pair[0], &pair[1]))
            .collect();

        let threshold = percentile(&distances, self.breakpoint_percentile);
        debug!(
            threshold,
            boundaries = distances.iter().filter(|d| **d > threshold).count(),
            "computed semantic breakpoints"
        );

        let mut segments = Vec::new();
        let mut current = String::new();
        for (i, sentence) in sentences.iter().enumerate() {
            current.push_str(sentence);
            let cut_here = i < distances.len() && distances[i] > threshold;
            if cut_here {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }

        Refinement::Refined(segments)
    }
}

/// Split text into sentence spans, each including its trailing punctuation
/// and whitespace so that concatenating the spans reconstructs the input.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = match iter.peek() {
                Some((_, next)) => next.is_whitespace(),
                None => true,
            };
            if at_boundary {
                let mut end = i + c.len_utf8();
                while let Some(&(j, next)) = iter.peek() {
                    if next.is_whitespace() {
                        end = j + next.len_utf8();
                        iter.next();
                    } else {
                        break;
                    }
                }
                sentences.push(&text[start..end]);
                start = end;
            }
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

/// Linearly interpolated percentile of a sample.
fn percentile(values: &[f32], p: f64) -> f32 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if upper >= sorted.len() {
        return sorted[sorted.len() - 1];
    }

    let weight = (pos - lower as f64) as f32;
    sorted[lower] + weight * (sorted[upper] - sorted[lower])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PlaybookError, Result};
    use async_trait::async_trait;

    /// Embedder that maps each text onto a fixed axis, so distances between
    /// topic groups are large and within groups are zero.
    struct TopicEmbedder;

    #[async_trait]
    impl Embedder for TopicEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let batch = self.embed_batch(&[text.to_string()]).await?;
            Ok(batch.into_iter().next().unwrap())
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    if t.contains("price") {
                        vec![1.0, 0.0]
                    } else {
                        vec![0.0, 1.0]
                    }
                })
                .collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    /// Embedder that fails on every call.
    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(PlaybookError::Embedding("rate limited".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(PlaybookError::Embedding("rate limited".to_string()))
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn cuts_at_topic_discontinuities() {
        let refiner = SemanticRefiner::new(Arc::new(TopicEmbedder), 90.0);
        let text = "The price matters. Raise the price. Hire slowly. Fire fast.";

        match refiner.refine(text).await {
            Refinement::Refined(segments) => {
                assert_eq!(segments.len(), 2);
                assert!(segments[0].contains("price"));
                assert!(segments[1].contains("Hire"));
                assert_eq!(segments.concat(), text);
            }
            Refinement::Degraded { reason } => panic!("unexpected degradation: {}", reason),
        }
    }

    #[tokio::test]
    async fn embedding_failure_degrades_instead_of_erroring() {
        let refiner = SemanticRefiner::new(Arc::new(FailingEmbedder), 95.0);
        let text = "One sentence. Two sentences. Three sentences. Four.";

        match refiner.refine(text).await {
            Refinement::Degraded { reason } => assert!(reason.contains("rate limited")),
            Refinement::Refined(_) => panic!("expected degradation"),
        }
    }

    #[tokio::test]
    async fn short_input_degrades() {
        let refiner = SemanticRefiner::new(Arc::new(TopicEmbedder), 95.0);
        match refiner.refine("Just one sentence.").await {
            Refinement::Degraded { .. } => {}
            Refinement::Refined(_) => panic!("expected degradation"),
        }
    }

    #[test]
    fn sentence_spans_reconstruct_the_input() {
        let text = "First point. Second point! Third? And a trailing clause";
        let sentences = split_sentences(text);

        assert_eq!(sentences.len(), 4);
        assert_eq!(sentences.concat(), text);
    }

    #[test]
    fn percentile_interpolates_between_ranks() {
        let values = vec![0.1, 0.2, 0.3, 0.4];
        assert!((percentile(&values, 50.0) - 0.25).abs() < 1e-6);
        assert!((percentile(&values, 100.0) - 0.4).abs() < 1e-6);
        assert_eq!(percentile(&[], 95.0), 0.0);
    }
}
