//! Token counting for chunk size budgets.
//!
//! All size thresholds in the chunking pipeline are expressed in tokens of a
//! fixed sub-word vocabulary. A single counter instance is constructed per
//! pipeline and shared by every stage, so a run never mixes vocabularies.

use crate::error::{PlaybookError, Result};
use std::sync::Arc;

/// Trait for counting tokens in text.
pub trait TokenCounter: Send + Sync {
    /// Count the number of tokens in the given text.
    fn count(&self, text: &str) -> usize;
}

/// Token counter backed by tiktoken's cl100k_base encoding.
///
/// cl100k_base is the vocabulary used by text-embedding-3-small, so chunk
/// budgets line up with what the embedding model actually sees.
pub struct TiktokenCounter {
    bpe: tiktoken_rs::CoreBPE,
}

impl TiktokenCounter {
    /// Create a new counter with the cl100k_base encoding.
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| PlaybookError::Tokenizer(format!("failed to load cl100k_base: {}", e)))?;
        Ok(Self { bpe })
    }

    /// Create a counter with a named encoding.
    pub fn with_encoding(encoding: &str) -> Result<Self> {
        let bpe = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            other => {
                return Err(PlaybookError::Tokenizer(format!(
                    "unknown encoding: {}",
                    other
                )))
            }
        }
        .map_err(|e| PlaybookError::Tokenizer(format!("failed to load encoding: {}", e)))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Shared handle to a token counter.
pub type SharedTokenCounter = Arc<dyn TokenCounter>;

#[cfg(test)]
pub mod testing {
    use super::TokenCounter;

    /// Deterministic counter for tests: one token per whitespace-separated word.
    ///
    /// Keeps test budgets easy to reason about without loading a BPE table.
    pub struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }
}
