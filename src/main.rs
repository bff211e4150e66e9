//! # Conflict Watch
//!
//! A daily batch job that asks a language model whether yesterday's news
//! reports an armed conflict started or escalated by a named external
//! actor, and publishes the verdict as a small JSON status file.
//!
//! ## Usage
//!
//! ```sh
//! NEWS_API_KEY=... ANTHROPIC_API_KEY=... conflict_watch
//! ```
//!
//! ## Architecture
//!
//! The run is a straight pipeline:
//! 1. **Fetching**: search NewsAPI for yesterday's headlines (at most 15 kept)
//! 2. **Classifying**: send them to the Anthropic Messages API and validate the JSON verdict
//! 3. **Output**: overwrite `status.json` with the verdict, or with a fixed
//!    "unclear" fallback if anything before this step failed
//!
//! Exit status is 0 on success and 1 on missing configuration or any
//! pipeline failure. A failed run still leaves a fresh status file.

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod classifier;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod sources;
mod utils;

use api::AnthropicClient;
use cli::Cli;

#[tokio::main(flavor = "current_thread")]
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

    let start_time = std::time::Instant::now();
    info!("conflict_watch starting up");

    // A missing .env is normal in production.
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "Loaded .env");
    }

    let args = Cli::parse();
    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Refusing to start");
            return ExitCode::FAILURE;
        }
    };
    debug!(
        status_file = %config.status_file.display(),
        model = %config.model,
        timeout = ?config.timeout,
        "Configuration loaded"
    );

    let http = match pipeline::http_client(&config) {
        Ok(http) => http,
        Err(e) => {
            error!(error = %e, "Refusing to start");
            return ExitCode::FAILURE;
        }
    };
    let asker = AnthropicClient::new(&http, &config);

    let outcome = pipeline::run(&http, &config, &asker).await;
    let elapsed = start_time.elapsed();

    match outcome {
        Ok(record) => {
            info!(
                status = %record.status,
                cited = record.headlines.len(),
                millis = elapsed.as_millis(),
                "Execution complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, millis = elapsed.as_millis(), "Execution failed");
            ExitCode::FAILURE
        }
    }
}
