//! Validated runtime configuration.
//!
//! [`Config`] is built from the parsed [`Cli`](crate::cli::Cli). Missing API
//! keys and malformed base URLs are rejected here, before any network or
//! file I/O happens.

use crate::error::PipelineError;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Search query sent to the news API.
pub const DEFAULT_QUERY: &str =
    "war OR invasion OR airstrike OR \"military strike\" OR \"armed conflict\" OR escalation";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_NEWS_API_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";

/// Name of the status file written next to the executable.
pub const STATUS_FILE_NAME: &str = "status.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub news_api_key: String,
    pub anthropic_api_key: String,
    pub news_api_url: Url,
    pub anthropic_api_url: Url,
    pub query: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub status_file: PathBuf,
}

/// Require a non-empty value for `name`.
pub(crate) fn require(value: Option<String>, name: &str) -> Result<String, PipelineError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(PipelineError::Config(format!("{name} is not set"))),
    }
}

pub(crate) fn parse_base_url(raw: &str, name: &str) -> Result<Url, PipelineError> {
    Url::parse(raw).map_err(|e| PipelineError::Config(format!("{name} is not a valid URL: {e}")))
}

/// `status.json` in the directory of the running executable.
///
/// Falls back to the working directory if the executable path is unknown.
pub fn default_status_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(STATUS_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(STATUS_FILE_NAME))
}

/// Join `segment` onto a base URL, keeping any path the base already has.
pub(crate) fn endpoint(base: &Url, segment: &str) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), segment)
}

#[cfg(test)]
pub(crate) fn test_config(news_api_url: &str, anthropic_api_url: &str, status_file: PathBuf) -> Config {
    Config {
        news_api_key: "news-key".to_string(),
        anthropic_api_key: "model-key".to_string(),
        news_api_url: Url::parse(news_api_url).expect("valid test URL"),
        anthropic_api_url: Url::parse(anthropic_api_url).expect("valid test URL"),
        query: DEFAULT_QUERY.to_string(),
        model: DEFAULT_MODEL.to_string(),
        max_tokens: DEFAULT_MAX_TOKENS,
        timeout: Duration::from_secs(5),
        status_file,
    }
}
