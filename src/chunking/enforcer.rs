//! Size enforcement for candidate chunks.

use super::splitter::RecursiveSplitter;
use crate::tokenizer::SharedTokenCounter;
use tracing::{debug, warn};

/// Default recursion depth cap for re-splitting oversized chunks.
const DEFAULT_MAX_DEPTH: usize = 10;

/// Result of an enforcement pass.
#[derive(Debug)]
pub struct EnforceOutcome {
    /// Surviving chunks, every one within [min, max] tokens.
    pub chunks: Vec<String>,
    /// Number of candidates discarded for being undersized (or irreducible
    /// at the depth cap).
    pub dropped: usize,
}

/// Corrective pass guaranteeing every emitted chunk's token count lies
/// within [min, max].
///
/// Oversized survivors are recursively re-split; undersized remainders are
/// dropped, never padded or merged. Dropping is a deliberate
/// precision-over-recall choice and is surfaced through the drop count.
pub struct SizeEnforcer {
    min_tokens: usize,
    max_tokens: usize,
    max_depth: usize,
    counter: SharedTokenCounter,
}

impl SizeEnforcer {
    pub fn new(counter: SharedTokenCounter, min_tokens: usize, max_tokens: usize) -> Self {
        Self {
            min_tokens,
            max_tokens,
            max_depth: DEFAULT_MAX_DEPTH,
            counter,
        }
    }

    /// Override the recursion depth cap.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enforce size bounds over a candidate sequence, preserving order.
    pub fn enforce(&self, candidates: Vec<String>, splitter: &RecursiveSplitter) -> EnforceOutcome {
        let mut chunks = Vec::new();
        let mut dropped = 0;

        for candidate in candidates {
            self.enforce_one(candidate, splitter, 0, &mut chunks, &mut dropped);
        }

        EnforceOutcome { chunks, dropped }
    }

    fn enforce_one(
        &self,
        text: String,
        splitter: &RecursiveSplitter,
        depth: usize,
        out: &mut Vec<String>,
        dropped: &mut usize,
    ) {
        let tokens = self.counter.count(&text);

        if tokens < self.min_tokens {
            debug!(tokens, min = self.min_tokens, "dropping undersized chunk");
            *dropped += 1;
            return;
        }

        if tokens <= self.max_tokens {
            out.push(text);
            return;
        }

        if depth >= self.max_depth {
            warn!(
                tokens,
                depth, "dropping irreducible oversized chunk at depth cap"
            );
            *dropped += 1;
            return;
        }

        let pieces = splitter.split(&text);
        if pieces.len() == 1 && pieces[0] == text {
            // The splitter made no progress; force a hard split at the
            // midpoint character offset so recursion always terminates.
            let (left, right) = split_midpoint(&text);
            let (left, right) = (left.to_string(), right.to_string());
            self.enforce_one(left, splitter, depth + 1, out, dropped);
            self.enforce_one(right, splitter, depth + 1, out, dropped);
            return;
        }

        for piece in pieces {
            self.enforce_one(piece, splitter, depth + 1, out, dropped);
        }
    }
}

/// Split at the midpoint character offset, nudged to a char boundary.
fn split_midpoint(text: &str) -> (&str, &str) {
    let mut mid = text.len() / 2;
    while mid < text.len() && !text.is_char_boundary(mid) {
        mid += 1;
    }
    text.split_at(mid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::testing::WordCounter;
    use crate::tokenizer::TokenCounter;
    use std::sync::Arc;

    fn harness(min: usize, max: usize) -> (SizeEnforcer, RecursiveSplitter) {
        let counter: SharedTokenCounter = Arc::new(WordCounter);
        (
            SizeEnforcer::new(counter.clone(), min, max),
            RecursiveSplitter::new(counter, max, 0),
        )
    }

    #[test]
    fn in_bounds_chunks_survive_unchanged() {
        let (enforcer, splitter) = harness(2, 10);
        let outcome = enforcer.enforce(vec!["four words right here".to_string()], &splitter);

        assert_eq!(outcome.chunks, vec!["four words right here".to_string()]);
        assert_eq!(outcome.dropped, 0);
    }

    #[test]
    fn undersized_chunks_are_dropped_not_merged() {
        let (enforcer, splitter) = harness(5, 10);
        let outcome = enforcer.enforce(
            vec!["too small".to_string(), "also tiny".to_string()],
            &splitter,
        );

        assert!(outcome.chunks.is_empty());
        assert_eq!(outcome.dropped, 2);
    }

    #[test]
    fn oversized_chunks_are_resplit_into_bounds() {
        let (enforcer, splitter) = harness(3, 10);
        let text = std::iter::repeat("word").take(45).collect::<Vec<_>>().join(" ");
        let outcome = enforcer.enforce(vec![text], &splitter);

        let counter = WordCounter;
        assert!(outcome.chunks.len() >= 4);
        for chunk in &outcome.chunks {
            let tokens = counter.count(chunk);
            assert!((3..=10).contains(&tokens), "out of bounds: {}", tokens);
        }
    }

    #[test]
    fn pathological_repetition_terminates_within_depth_cap() {
        // A single-token word repeated thousands of times, no sentence or
        // paragraph boundaries anywhere.
        let (enforcer, splitter) = harness(150, 400);
        let text = std::iter::repeat("word").take(2000).collect::<Vec<_>>().join(" ");
        let outcome = enforcer.enforce(vec![text], &splitter);

        let counter = WordCounter;
        assert!(outcome.chunks.len() > 1);
        for chunk in &outcome.chunks {
            let tokens = counter.count(chunk);
            assert!((150..=400).contains(&tokens), "out of bounds: {}", tokens);
        }
    }

    #[test]
    fn separatorless_run_terminates_within_bounds() {
        // No whitespace at all: the word-level separator never applies and
        // the character-level fallback must still terminate.
        struct SingleTokenPerFiveChars;
        impl TokenCounter for SingleTokenPerFiveChars {
            fn count(&self, text: &str) -> usize {
                text.chars().count().div_ceil(5)
            }
        }

        let counter: SharedTokenCounter = Arc::new(SingleTokenPerFiveChars);
        let enforcer = SizeEnforcer::new(counter.clone(), 1, 10);
        let splitter = RecursiveSplitter::new(counter.clone(), 10, 0);

        let text = "a".repeat(600);
        let outcome = enforcer.enforce(vec![text.clone()], &splitter);

        assert!(!outcome.chunks.is_empty());
        for chunk in &outcome.chunks {
            assert!(counter.count(chunk) <= 10);
        }
        // Nothing was silently lost.
        let total_chars: usize = outcome.chunks.iter().map(|c| c.len()).sum();
        assert_eq!(total_chars, text.len());
    }
}
