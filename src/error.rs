//! Error taxonomy for the pipeline.
//!
//! Every stage returns [`PipelineError`]. The orchestrator treats all
//! fetch and classify variants the same way (fallback write, exit 1); the
//! variants exist so the log line says what actually went wrong.

use thiserror::Error;

/// Anything that can stop a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required configuration is missing or malformed. Fatal before any I/O.
    #[error("configuration error: {0}")]
    Config(String),

    /// The news search API was unreachable, failed, or returned no articles.
    #[error("headline fetch failed: {0}")]
    Fetch(String),

    /// The completion API was unreachable or returned a non-success status.
    #[error("completion call failed: {0}")]
    Call(String),

    /// The completion API answered but without any usable text.
    #[error("completion returned no text")]
    EmptyResponse,

    /// The model's text is not valid JSON.
    #[error("could not parse model output as JSON: {source}")]
    Parse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    /// Classifier input or the model's parsed JSON failed a schema check.
    #[error("invalid `{field}`: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("failed to write status file: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to encode status record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PipelineError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}
