//! Headline classification.
//!
//! Builds the instruction prompt, asks the model through [`AskAsync`], and
//! turns the reply into a validated [`ClassificationResult`].

use crate::api::AskAsync;
use crate::error::PipelineError;
use crate::models::{ClassificationResult, Headline, HeadlineRef, Status};
use crate::utils::{looks_truncated, strip_code_fences, truncate_for_log};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

const TASK: &str = r#"You are monitoring the news for one question: is there an armed conflict that a named external actor has started or escalated in the last day?

Count it as "yes" only when the headlines report actual use of military force (strikes, invasion, shelling, armed incursion, a declared war) and name the state or armed group that initiated or escalated it against another country or territory.

Do NOT count:
- threats, warnings, ultimatums, sanctions, or military exercises
- long-running conflicts with no new escalation reported in these headlines
- domestic unrest, crime, terrorism without a named state or group behind it
- analysis, opinion, anniversaries, or historical pieces

Answer "unclear" when the headlines hint at escalation but do not establish who acted or whether force was actually used. Otherwise answer "no".

Respond with ONLY a JSON object, no prose, in this exact shape:
{"status": "no" | "unclear" | "yes", "tagline": "<one short, dry sentence summing up the day>", "headlines": [{"title": "...", "url": "...", "source": "..."}]}

"headlines" must contain the 2 or 3 headlines from the list below that best support your answer, copied exactly."#;

/// Classify `headlines` with the model behind `asker`.
///
/// # Errors
///
/// - [`PipelineError::Validation`] if `headlines` is empty (no call is made)
/// - whatever `asker` returns ([`PipelineError::Call`], [`PipelineError::EmptyResponse`])
/// - [`PipelineError::Parse`] if the reply is not JSON
/// - [`PipelineError::Validation`] if the reply fails the schema checks
#[instrument(level = "info", skip_all, fields(count = headlines.len()))]
pub async fn classify<A: AskAsync>(
    asker: &A,
    headlines: &[Headline],
) -> Result<ClassificationResult, PipelineError> {
    if headlines.is_empty() {
        return Err(PipelineError::validation("headlines", "no headlines to classify"));
    }

    let prompt = build_prompt(headlines);
    let reply = asker.ask(&prompt).await?;
    debug!(reply = %truncate_for_log(&reply, 500), "Model reply");

    let result = parse_classification(&reply)?;
    info!(status = %result.status, tagline = %result.tagline, cited = result.headlines.len(), "Headlines classified");
    Ok(result)
}

/// The full prompt: task description followed by the numbered headline list.
pub fn build_prompt(headlines: &[Headline]) -> String {
    let mut prompt = String::with_capacity(TASK.len() + headlines.len() * 200);
    prompt.push_str(TASK);
    prompt.push_str("\n\nHeadlines:\n");

    for (i, h) in headlines.iter().enumerate() {
        prompt.push_str(&format!("{}. {} ({})\n", i + 1, h.title, h.source));
        prompt.push_str(&format!("   URL: {}\n", h.url));
        if !h.description.is_empty() {
            prompt.push_str(&format!("   {}\n", h.description));
        }
    }

    prompt
}

/// Parse and validate the model's raw reply.
pub fn parse_classification(raw: &str) -> Result<ClassificationResult, PipelineError> {
    let body = strip_code_fences(raw);
    let value: Value = serde_json::from_str(body).map_err(|source| {
        if looks_truncated(&source) {
            warn!(bytes = raw.len(), "Model reply ends mid-JSON; max_tokens may be too low");
        }
        PipelineError::Parse {
            raw: raw.to_string(),
            source,
        }
    })?;

    validate(&value)
}

fn validate(value: &Value) -> Result<ClassificationResult, PipelineError> {
    let status = value
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| PipelineError::validation("status", "missing or not a string"))?
        .parse::<Status>()
        .map_err(|reason| PipelineError::validation("status", reason))?;

    let tagline = match value.get("tagline").and_then(Value::as_str) {
        Some(t) if !t.trim().is_empty() => t.to_string(),
        _ => return Err(PipelineError::validation("tagline", "must be a non-empty string")),
    };

    let headlines = match value.get("headlines").and_then(Value::as_array) {
        Some(items) if !items.is_empty() => items
            .iter()
            .map(|item| serde_json::from_value::<HeadlineRef>(item.clone()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PipelineError::validation("headlines", format!("malformed entry: {e}")))?,
        _ => return Err(PipelineError::validation("headlines", "must be a non-empty array")),
    };

    Ok(ClassificationResult {
        status,
        tagline,
        headlines,
    })
}
