//! Recursive separator-based text splitting.

use crate::tokenizer::SharedTokenCounter;

/// Splits oversized text using an ordered separator hierarchy.
///
/// Separators are tried from semantically largest (paragraph breaks) down to
/// the empty string, the guaranteed-terminating character-level fallback.
/// The splitter is best-effort: a piece with no usable separator inside the
/// budget can still come back oversized, which is why downstream size
/// enforcement is mandatory.
pub struct RecursiveSplitter {
    separators: Vec<&'static str>,
    max_tokens: usize,
    overlap_tokens: usize,
    counter: SharedTokenCounter,
}

impl RecursiveSplitter {
    /// Create a splitter with the default separator hierarchy.
    pub fn new(counter: SharedTokenCounter, max_tokens: usize, overlap_tokens: usize) -> Self {
        Self {
            separators: vec![
                "\n\n", // paragraphs
                "\n",   // lines
                ". ",   // sentences
                " ",    // words
                "",     // characters, last resort
            ],
            max_tokens,
            overlap_tokens,
            counter,
        }
    }

    /// Create a splitter with custom separators.
    pub fn with_separators(
        counter: SharedTokenCounter,
        max_tokens: usize,
        overlap_tokens: usize,
        separators: Vec<&'static str>,
    ) -> Self {
        Self {
            separators,
            max_tokens,
            overlap_tokens,
            counter,
        }
    }

    /// Split text into pieces whose token counts aim to stay under the
    /// budget. Each returned piece is a contiguous substring of the input.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_level(text, 0)
    }

    fn split_level(&self, text: &str, level: usize) -> Vec<String> {
        if text.is_empty() {
            return vec![];
        }

        if self.counter.count(text) <= self.max_tokens {
            return vec![text.to_string()];
        }

        if level >= self.separators.len() {
            return self.split_by_chars(text);
        }

        let separator = self.separators[level];
        if separator.is_empty() {
            return self.split_by_chars(text);
        }

        let pieces: Vec<&str> = text.split(separator).collect();
        if pieces.len() <= 1 {
            // Separator not present; try the next level.
            return self.split_level(text, level + 1);
        }

        self.merge_pieces(pieces, separator, level)
    }

    /// Join adjacent pieces back up to the budget, carrying overlap between
    /// emitted chunks. Oversized pieces recurse into finer separators.
    fn merge_pieces(&self, pieces: Vec<&str>, separator: &str, level: usize) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for piece in pieces {
            if self.counter.count(piece) > self.max_tokens {
                if !current.is_empty() {
                    chunks.push(current.join(separator));
                    current = Vec::new();
                }
                chunks.extend(self.split_level(piece, level + 1));
                continue;
            }

            if current.is_empty() {
                current.push(piece);
                continue;
            }

            let candidate = format!("{}{}{}", current.join(separator), separator, piece);
            if self.counter.count(&candidate) <= self.max_tokens {
                current.push(piece);
            } else {
                chunks.push(current.join(separator));
                let mut next = self.overlap_tail(&current);
                next.push(piece);
                if self.counter.count(&next.join(separator)) > self.max_tokens {
                    // Overlap seed plus the new piece overshoots; the piece
                    // alone is known to fit.
                    next = vec![piece];
                }
                current = next;
            }
        }

        if !current.is_empty() {
            chunks.push(current.join(separator));
        }

        chunks
    }

    /// Trailing pieces of the previous chunk worth up to `overlap_tokens`,
    /// in source order.
    fn overlap_tail<'a>(&self, pieces: &[&'a str]) -> Vec<&'a str> {
        if self.overlap_tokens == 0 {
            return Vec::new();
        }

        let mut tail: Vec<&'a str> = Vec::new();
        let mut tokens = 0;
        for piece in pieces.iter().rev() {
            let piece_tokens = self.counter.count(piece);
            if tokens + piece_tokens > self.overlap_tokens {
                break;
            }
            tail.insert(0, piece);
            tokens += piece_tokens;
        }
        tail
    }

    /// Character-level budget split, the terminating fallback.
    fn split_by_chars(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for c in text.chars() {
            current.push(c);
            if self.counter.count(&current) >= self.max_tokens {
                chunks.push(std::mem::take(&mut current));
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::testing::WordCounter;
    use std::sync::Arc;

    fn splitter(max_tokens: usize, overlap: usize) -> RecursiveSplitter {
        RecursiveSplitter::new(Arc::new(WordCounter), max_tokens, overlap)
    }

    #[test]
    fn small_text_passes_through() {
        let pieces = splitter(100, 0).split("a short run of words");
        assert_eq!(pieces, vec!["a short run of words".to_string()]);
    }

    #[test]
    fn splits_on_paragraphs_first() {
        let text = "one two three\n\nfour five six\n\nseven eight nine";
        let pieces = splitter(4, 0).split(text);

        assert_eq!(pieces.len(), 3);
        assert!(pieces.iter().all(|p| text.contains(p.as_str())));
    }

    #[test]
    fn every_piece_is_a_substring_of_the_input() {
        let text = "Value beats price. Sell the outcome. Raise the offer. \
                    Keep the promise. Deliver fast. Charge more.";
        let pieces = splitter(6, 2).split(text);

        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(text.contains(piece.as_str()), "not a substring: {:?}", piece);
        }
    }

    #[test]
    fn word_level_split_respects_budget() {
        let text = std::iter::repeat("word").take(100).collect::<Vec<_>>().join(" ");
        let pieces = splitter(10, 0).split(&text);

        let counter = WordCounter;
        use crate::tokenizer::TokenCounter;
        assert!(pieces.len() >= 10);
        for piece in &pieces {
            assert!(counter.count(piece) <= 10);
        }
    }

    #[test]
    fn overlap_repeats_previous_tail() {
        let text = (1..=20).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let pieces = splitter(5, 2).split(&text);

        assert!(pieces.len() > 2);
        // The second chunk starts with the tail of the first.
        let first_words: Vec<&str> = pieces[0].split(' ').collect();
        let second_words: Vec<&str> = pieces[1].split(' ').collect();
        assert_eq!(second_words[0], first_words[first_words.len() - 2]);
        assert_eq!(second_words[1], first_words[first_words.len() - 1]);
    }

    #[test]
    fn separatorless_text_falls_back_to_characters() {
        // One giant "word": only the character-level fallback applies.
        let text = "a".repeat(500);
        let counter: SharedTokenCounter = Arc::new(CharCounter);
        let splitter = RecursiveSplitter::new(counter, 50, 0);
        let pieces = splitter.split(&text);

        assert!(pieces.len() >= 10);
        let rebuilt: String = pieces.concat();
        assert_eq!(rebuilt, text);
    }

    /// One token per character, for exercising the fallback path.
    struct CharCounter;

    impl crate::tokenizer::TokenCounter for CharCounter {
        fn count(&self, text: &str) -> usize {
            text.chars().count()
        }
    }
}
