//! Data models shared by the pipeline stages.
//!
//! - [`Headline`]: normalized article summary fed to the classifier
//! - [`HeadlineRef`]: the `{title, url, source}` projection the model cites
//! - [`ClassificationResult`]: validated model verdict
//! - [`StatusRecord`]: what ends up in the status file
//!
//! Field order in [`StatusRecord`] is the order consumers see in the file.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tagline written when any stage of the run fails.
pub const FALLBACK_TAGLINE: &str =
    "Sorry, we couldn't read the news today. Check back tomorrow.";

/// A news headline as handed to the classifier.
///
/// Built by the fetcher from a raw API article after filtering and title
/// normalization. `description` is empty when the API sent none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub title: String,
    pub url: String,
    pub source: String,
    pub description: String,
}

/// A headline as cited by the model and persisted in the status file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HeadlineRef {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
}

/// The three-way verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    No,
    Unclear,
    Yes,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::No => "no",
            Status::Unclear => "unclear",
            Status::Yes => "yes",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no" => Ok(Status::No),
            "unclear" => Ok(Status::Unclear),
            "yes" => Ok(Status::Yes),
            other => Err(format!("expected one of no, unclear, yes; got {other:?}")),
        }
    }
}

/// A model verdict that passed validation.
///
/// `tagline` is non-empty and `headlines` has at least one entry; the
/// classifier refuses to build one otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub status: Status,
    pub tagline: String,
    pub headlines: Vec<HeadlineRef>,
}

/// The persisted status file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusRecord {
    pub status: Status,
    pub tagline: String,
    /// ISO-8601 UTC with millisecond precision, e.g. `2025-05-06T08:00:00.000Z`.
    pub updated: String,
    pub headlines: Vec<HeadlineRef>,
}

impl StatusRecord {
    /// Stamp a classification with the current time.
    pub fn from_classification(result: ClassificationResult) -> Self {
        Self {
            status: result.status,
            tagline: result.tagline,
            updated: now_iso8601(),
            headlines: result.headlines,
        }
    }

    /// The fixed record written when the run fails.
    pub fn fallback() -> Self {
        Self {
            status: Status::Unclear,
            tagline: FALLBACK_TAGLINE.to_string(),
            updated: now_iso8601(),
            headlines: Vec::new(),
        }
    }
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
