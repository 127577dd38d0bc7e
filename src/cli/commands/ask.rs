//! Ask command implementation.

use super::preflight;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::content::ContentType;
use crate::orchestrator::Orchestrator;
use crate::rag::Answer;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    content_type: ContentType,
    source: Option<&str>,
    limit: Option<usize>,
    owner: &str,
    settings: Settings,
) -> Result<()> {
    preflight(Operation::Ask, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching your library...");

    if content_type == ContentType::Comment {
        let result = orchestrator
            .ask_comments(owner, question, source, limit)
            .await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                print_answer(&response.answer);
                if response.total_comments > 0 {
                    Output::header("Sentiment");
                    let breakdown = response.sentiment_breakdown;
                    Output::kv("Positive", &breakdown.positive.to_string());
                    Output::kv("Negative", &breakdown.negative.to_string());
                    Output::kv("Neutral", &breakdown.neutral.to_string());
                }
            }
            Err(e) => {
                Output::error(&format!("Failed to generate answer: {}", e));
                return Err(e.into());
            }
        }
        return Ok(());
    }

    let result = orchestrator
        .ask(content_type, owner, question, source, limit)
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(answer) => print_answer(&answer),
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("\n{}\n", answer.text);

    if !answer.sources.is_empty() {
        Output::header("Sources");
        for (i, source) in answer.sources.iter().enumerate() {
            Output::search_result(i + 1, source);
        }
    }
}
