//! vidsage CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vidsage::cli::{commands, Cli, Commands};
use vidsage::config::{Settings, VectorStoreProvider};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("vidsage={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    if settings.vector_store.provider == VectorStoreProvider::Memory {
        tracing::warn!("Using the in-memory vector store; nothing will be persisted");
    }

    let owner = cli
        .owner
        .clone()
        .unwrap_or_else(|| settings.general.default_owner.clone());

    // Execute command
    match &cli.command {
        Commands::Ingest {
            input,
            content_type,
            source,
            title,
            replace,
        } => {
            commands::run_ingest(input, *content_type, source, title.clone(), *replace, &owner, settings)
                .await?;
        }

        Commands::IngestComments { input, video, title } => {
            commands::run_ingest_comments(input, video, title.clone(), &owner, settings).await?;
        }

        Commands::Ask {
            question,
            content_type,
            source,
            limit,
        } => {
            commands::run_ask(question, *content_type, source.as_deref(), *limit, &owner, settings)
                .await?;
        }

        Commands::Search {
            query,
            content_type,
            source,
            limit,
        } => {
            commands::run_search(query, *content_type, source.as_deref(), *limit, &owner, settings)
                .await?;
        }

        Commands::List => {
            commands::run_list(&owner, settings).await?;
        }

        Commands::Delete {
            source,
            content_type,
        } => {
            commands::run_delete(source, *content_type, &owner, settings).await?;
        }

        Commands::Insights { video } => {
            commands::run_insights(video, &owner, settings).await?;
        }

        Commands::Analyze { video, duration } => {
            commands::run_analyze(video, *duration, &owner, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
