//! # Advent Summary
//!
//! Turns a tech Advent calendar into a CSV report: every posted article is
//! fetched, classified into a genre and summarized by an LLM, and written as
//! one row in calendar order.
//!
//! ## Supported calendars
//!
//! - Adventar (`adventar.org`)
//! - Qiita Advent Calendar (`qiita.com`)
//!
//! ## Usage
//!
//! ```sh
//! GEMINI_API_KEY=... advent_summary https://adventar.org/calendars/10000 ./summary.csv
//! ```
//!
//! ## Architecture
//!
//! 1. **Collecting**: fetch the calendar page and extract the posted entries
//! 2. **Fetching**: download each article and extract its title and body text
//! 3. **Classifying**: ask the LLM for a genre and summary, rate limited
//! 4. **Output**: write the CSV report
//!
//! Exit status is 0 when the CSV was written, 3 when the calendar had no
//! posted articles, and 1 on any fatal error.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod classifier;
mod cli;
mod config;
mod content;
mod error;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod rate_limiter;
mod scrapers;
mod utils;

use cli::Cli;
use config::AppConfig;
use pipeline::RunOutcome;

/// Exit status when the calendar has no posted articles.
const EXIT_NOTHING_TO_DO: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("advent_summary starting up");

    let args = Cli::parse();
    debug!(calendar_url = %args.calendar_url, output_path = %args.output_path.display(), "Parsed CLI arguments");

    let config = match AppConfig::load(args.config.as_deref()).and_then(|c| c.apply_cli(&args)) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    debug!(?config, "Effective configuration");

    match pipeline::run(&config, &args.calendar_url, &args.output_path).await {
        Ok(RunOutcome::Written { path, rows }) => {
            info!(path = %path.display(), rows, "CSV report written");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::NothingToDo) => {
            info!("No articles to summarize");
            ExitCode::from(EXIT_NOTHING_TO_DO)
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            ExitCode::FAILURE
        }
    }
}
