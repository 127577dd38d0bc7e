//! CLI output formatting utilities.

use crate::comments::CommentSummary;
use crate::ingest::IngestReport;
use crate::rag::Source;
use crate::vector_store::IndexedSource;
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

    /// Print an ingested source.
    pub fn source_info(source: &IndexedSource) {
        println!(
            "  {} {} ({}, {}, {} chunks, {})",
            style("*").cyan(),
            style(&source.source_title).bold(),
            style(&source.source_id).dim(),
            source.content_type,
            source.chunk_count,
            source.ingested_at.format("%Y-%m-%d %H:%M")
        );
    }

    /// Print a retrieved excerpt.
    pub fn search_result(index: usize, source: &Source) {
        println!(
            "\n{} [{}] {} ({}, score: {:.2})",
            style(">>").green(),
            index,
            style(&source.source_title).bold(),
            style(&source.source_id).cyan(),
            source.score
        );
        println!("   {}", content_preview(&source.content, 200));
    }

    /// Print a comment excerpt.
    pub fn comment(comment: &CommentSummary) {
        println!(
            "  {} {} {}",
            style("*").cyan(),
            content_preview(&comment.text, 120),
            style(format!("({}, {} likes)", comment.author, comment.likes)).dim()
        );
    }

    /// Print an ingestion report, including failed chunks.
    pub fn ingest_report(report: &IngestReport) {
        if report.is_complete() {
            Output::success(&format!(
                "Ingested {} chunks for {}",
                report.chunks_written, report.source_id
            ));
        } else {
            Output::warning(&format!(
                "Ingested {} of {} chunks for {}",
                report.chunks_written, report.chunks_total, report.source_id
            ));
            for failed in &report.failed {
                Output::kv(
                    &format!("chunk {}", failed.index),
                    &format!("{:?}: {}", failed.stage, failed.error),
                );
            }
        }
        if report.chunks_replaced > 0 {
            Output::kv("Replaced", &report.chunks_replaced.to_string());
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short\ntext", 20), "short text");
        assert_eq!(content_preview("abcdef", 3), "abc...");
        assert_eq!(content_preview("ééééé", 2), "éé...");
    }
}
