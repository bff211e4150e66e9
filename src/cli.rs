//! Command-line interface definitions.
//!
//! Every option can also come from the environment. API keys are optional
//! at parse time so that a missing key is reported as a configuration error
//! (exit 1) instead of a clap usage error.

use crate::config::{
    self, Config, DEFAULT_ANTHROPIC_API_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_NEWS_API_URL, DEFAULT_QUERY, DEFAULT_TIMEOUT_SECS,
};
use crate::error::PipelineError;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Keys from the environment (or a .env file)
/// NEWS_API_KEY=... ANTHROPIC_API_KEY=... conflict_watch
///
/// # Write somewhere other than next to the binary
/// conflict_watch --status-file /var/www/status.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// Anthropic API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    /// Path of the status file (defaults to status.json next to the executable)
    #[arg(short, long, env = "STATUS_FILE")]
    pub status_file: Option<PathBuf>,

    /// Search query sent to the news API
    #[arg(short, long, default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Model identifier for the completion API
    #[arg(short, long, env = "ANTHROPIC_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Maximum output tokens for the completion
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Base URL of the news search API
    #[arg(long, env = "NEWS_API_URL", default_value = DEFAULT_NEWS_API_URL)]
    pub news_api_url: String,

    /// Base URL of the completion API
    #[arg(long, env = "ANTHROPIC_API_URL", default_value = DEFAULT_ANTHROPIC_API_URL)]
    pub anthropic_api_url: String,
}

impl Cli {
    /// Validate arguments into a [`Config`].
    pub fn into_config(self) -> Result<Config, PipelineError> {
        let news_api_key = config::require(self.news_api_key, "NEWS_API_KEY")?;
        let anthropic_api_key = config::require(self.anthropic_api_key, "ANTHROPIC_API_KEY")?;
        let news_api_url = config::parse_base_url(&self.news_api_url, "news API URL")?;
        let anthropic_api_url =
            config::parse_base_url(&self.anthropic_api_url, "Anthropic API URL")?;

        if self.timeout_secs == 0 {
            return Err(PipelineError::Config("timeout must be at least 1 second".to_string()));
        }

        Ok(Config {
            news_api_key,
            anthropic_api_key,
            news_api_url,
            anthropic_api_url,
            query: self.query,
            model: self.model,
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.timeout_secs),
            status_file: self.status_file.unwrap_or_else(config::default_status_path),
        })
    }
}
