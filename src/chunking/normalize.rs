//! Transcript text normalization.
//!
//! Strips transcription noise before splitting: stray characters, runaway
//! whitespace, stutter repeats, and spoken intro/outro boilerplate.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Conservative character set: alphanumerics plus basic punctuation.
    static ref DISALLOWED: Regex = Regex::new(r#"[^A-Za-z0-9\s.,!?;:'"()\-$%&]"#).unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref INTRO_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)^(?:hey guys|hi everyone|hello everyone|welcome back)[^.!?]*[.!?]\s*")
            .unwrap(),
        Regex::new(r"(?i)^today,? i'?m going to[^.!?]*[.!?]\s*").unwrap(),
        Regex::new(r"(?i)^in (?:this|today's) video[^.!?]*[.!?]\s*").unwrap(),
    ];
    static ref OUTRO_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\s*thanks for watching[^.!?]*[.!?]?\s*$").unwrap(),
        Regex::new(r"(?i)\s*(?:don'?t forget to|make sure (?:you|to))[^.!?]*subscribe[^.!?]*[.!?]?\s*$")
            .unwrap(),
        Regex::new(r"(?i)\s*(?:smash|hit) th(?:at|e) like button[^.!?]*[.!?]?\s*$").unwrap(),
        Regex::new(r"(?i)\s*see you in the next (?:one|video)[^.!?]*[.!?]?\s*$").unwrap(),
    ];
}

/// Cleans raw transcript text into a stable, splittable form.
///
/// Normalization is idempotent: applying it to already-normalized text
/// returns the text unchanged.
#[derive(Debug, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a raw transcript. Always returns a string; pure noise
    /// normalizes to an empty string.
    pub fn normalize(&self, raw: &str) -> String {
        let stripped = DISALLOWED.replace_all(raw, "");
        let collapsed = WHITESPACE.replace_all(&stripped, " ");
        let collapsed = collapse_stutter(collapsed.trim());

        let mut text = collapsed;
        loop {
            let mut changed = false;
            for pattern in INTRO_PATTERNS.iter() {
                let next = pattern.replace(&text, "");
                if next != text {
                    text = next.into_owned();
                    changed = true;
                }
            }
            for pattern in OUTRO_PATTERNS.iter() {
                let next = pattern.replace(&text, "");
                if next != text {
                    text = next.into_owned();
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        text.trim().to_string()
    }
}

/// Collapse immediate triple-or-more repetition of the same word to a single
/// occurrence. Double repeats are left alone; they are often legitimate
/// emphasis ("very very").
fn collapse_stutter(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut result: Vec<&str> = Vec::new();
    let mut run: Vec<&str> = Vec::new();

    for word in text.split(' ') {
        if let Some(prev) = run.last() {
            if prev.eq_ignore_ascii_case(word) {
                run.push(word);
                continue;
            }
            flush_run(&mut result, &run);
            run.clear();
        }
        run.push(word);
    }
    flush_run(&mut result, &run);

    result.join(" ")
}

fn flush_run<'a>(result: &mut Vec<&'a str>, run: &[&'a str]) {
    if run.len() >= 3 {
        result.push(run[0]);
    } else {
        result.extend_from_slice(run);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs() {
        let normalizer = Normalizer::new();
        assert_eq!(
            normalizer.normalize("the   offer\n\nis\teverything"),
            "the offer is everything"
        );
    }

    #[test]
    fn strips_characters_outside_the_conservative_set() {
        let normalizer = Normalizer::new();
        assert_eq!(
            normalizer.normalize("price is $100 \u{1F680} (net), ok?"),
            "price is $100 (net), ok?"
        );
    }

    #[test]
    fn collapses_stutter_repeats() {
        let normalizer = Normalizer::new();
        assert_eq!(
            normalizer.normalize("the the the offer matters"),
            "the offer matters"
        );
        // double repeats are kept
        assert_eq!(
            normalizer.normalize("very very important"),
            "very very important"
        );
    }

    #[test]
    fn removes_intro_and_outro_boilerplate() {
        let normalizer = Normalizer::new();
        let raw = "Welcome back to the channel everyone! Pricing drives margin. \
                   Thanks for watching, see you soon!";
        assert_eq!(normalizer.normalize(raw), "Pricing drives margin.");
    }

    #[test]
    fn normalization_is_idempotent() {
        let normalizer = Normalizer::new();
        let raw = "Hey guys, welcome! So so so the point is:   value first. \
                   Don't forget to like and subscribe!";
        let once = normalizer.normalize(raw);
        let twice = normalizer.normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn pure_noise_normalizes_to_empty() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("\u{1F600}\u{1F600}  \u{2728}"), "");
    }
}
