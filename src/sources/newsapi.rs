//! NewsAPI headline fetcher.
//!
//! Queries the [`/everything`](https://newsapi.org/docs/endpoints/everything)
//! endpoint for articles published since yesterday, then drops incomplete
//! articles, strips the ` - Publisher` suffix NewsAPI leaves on titles, and
//! keeps the first [`MAX_HEADLINES`].

use super::MAX_HEADLINES;
use crate::config::{self, Config};
use crate::error::PipelineError;
use crate::models::Headline;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

const PAGE_SIZE: &str = "20";

/// ` - Some Outlet` at the very end of a title. The outlet name may contain
/// in-word hyphens (`Post-Gazette`) but not another ` - ` separator.
static PUBLISHER_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+-\s+(?:[^-]|-\S)+$").expect("valid publisher suffix regex"));

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawArticle {
    pub title: Option<String>,
    pub url: Option<String>,
    pub source: Option<RawSource>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSource {
    pub name: Option<String>,
}

/// Fetch and normalize headlines published on or after `from`.
///
/// # Errors
///
/// [`PipelineError::Fetch`] if the request fails, the API answers with a
/// non-success status, the body is not the expected JSON, or the API
/// returns no articles at all. Articles filtered away locally are not an
/// error; the result may then be empty.
#[instrument(level = "info", skip_all, fields(%from))]
pub async fn fetch_headlines(
    http: &Client,
    config: &Config,
    from: NaiveDate,
) -> Result<Vec<Headline>, PipelineError> {
    let url = config::endpoint(&config.news_api_url, "everything");
    let from = from.format("%Y-%m-%d").to_string();

    let response = http
        .get(&url)
        .header("X-Api-Key", &config.news_api_key)
        .query(&[
            ("q", config.query.as_str()),
            ("from", from.as_str()),
            ("sortBy", "relevancy"),
            ("language", "en"),
            ("pageSize", PAGE_SIZE),
        ])
        .send()
        .await
        .map_err(|e| PipelineError::Fetch(format!("request to news API failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PipelineError::Fetch(format!("news API returned {status}: {body}")));
    }

    let body: SearchResponse = response
        .json()
        .await
        .map_err(|e| PipelineError::Fetch(format!("could not decode news API response: {e}")))?;

    if body.articles.is_empty() {
        return Err(PipelineError::Fetch("news API returned no articles".to_string()));
    }

    let raw_count = body.articles.len();
    let headlines = normalize_articles(body.articles);
    info!(raw = raw_count, kept = headlines.len(), "Fetched headlines");
    debug!(titles = ?headlines.iter().map(|h| &h.title).collect::<Vec<_>>(), "Headline titles");

    Ok(headlines)
}

/// Filter, normalize and truncate raw articles, preserving their order.
pub(crate) fn normalize_articles(articles: Vec<RawArticle>) -> Vec<Headline> {
    articles
        .into_iter()
        .filter_map(|article| {
            let title = non_empty(article.title)?;
            let url = non_empty(article.url)?;
            let source = non_empty(article.source.and_then(|s| s.name))?;
            Some(Headline {
                title: strip_publisher_suffix(&title),
                url,
                source,
                description: article.description.unwrap_or_default(),
            })
        })
        .take(MAX_HEADLINES)
        .collect()
}

/// `"Big Event - Some News Outlet"` becomes `"Big Event"`.
pub(crate) fn strip_publisher_suffix(title: &str) -> String {
    PUBLISHER_SUFFIX.replace(title, "").into_owned()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
