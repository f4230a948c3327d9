//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print transcript info.
    pub fn transcript_info(title: &str, id: &str, chunks: u32) {
        println!(
            "  {} {} ({}, {} chunks)",
            style("*").cyan(),
            style(title).bold(),
            style(id).dim(),
            chunks
        );
    }

    /// Print a search result.
    pub fn search_result(title: &str, score: f32, content: &str, url: &str) {
        println!(
            "\n{} {} (score: {:.2})",
            style(">>").green(),
            style(title).bold(),
            score
        );
        println!("   {}", content_preview(content, 200));
        println!("   {}", style(url).dim());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_len: usize) -> String {
    let content = content.replace('\n', " ");
    if content.len() <= max_len {
        content
    } else {
        let mut end = max_len;
        while !content.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &content[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_content() {
        let long = "x".repeat(500);
        let preview = content_preview(&long, 200);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.len(), 203);
    }

    #[test]
    fn preview_keeps_short_content() {
        assert_eq!(content_preview("short", 200), "short");
    }
}
