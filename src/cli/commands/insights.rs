//! Insights command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the insights command.
pub async fn run_insights(video: &str, owner: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let insights = match orchestrator.comment_insights(owner, video).await {
        Ok(insights) => insights,
        Err(e) => {
            Output::error(&format!("Failed to load comments: {}", e));
            return Err(e.into());
        }
    };

    if insights.total_comments == 0 {
        Output::info("No comments ingested for this video. Use 'vidsage ingest-comments' first.");
        return Ok(());
    }

    Output::header(&format!(
        "Comments on {} ({})",
        insights.video_id, insights.total_comments
    ));
    let trends = insights.sentiment_trends;
    Output::kv("Positive", &trends.positive.to_string());
    Output::kv("Negative", &trends.negative.to_string());
    Output::kv("Neutral", &trends.neutral.to_string());

    if !insights.top_positive_comments.is_empty() {
        Output::header("Top positive");
        insights.top_positive_comments.iter().for_each(Output::comment);
    }

    if !insights.top_negative_comments.is_empty() {
        Output::header("Top negative");
        insights.top_negative_comments.iter().for_each(Output::comment);
    }

    Ok(())
}
