//! CLI command implementations.

mod analyze;
mod ask;
mod config;
mod delete;
mod ingest;
mod insights;
mod list;
mod search;
mod serve;

pub use analyze::run_analyze;
pub use ask::run_ask;
pub use config::run_config;
pub use delete::run_delete;
pub use ingest::{run_ingest, run_ingest_comments};
pub use insights::run_insights;
pub use list::run_list;
pub use search::run_search;
pub use serve::run_serve;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::{Context, Result};
use std::io::Read;

/// Read a file, or stdin when the path is `-`.
fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        return Ok(buffer);
    }

    let path = Settings::expand_path(input);
    std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Run pre-flight checks, printing the failure before returning it.
fn preflight(operation: Operation, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(operation, settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }
    Ok(())
}
