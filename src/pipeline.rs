//! Fetch → classify → write, with a single error boundary.
//!
//! Any fetch or classify failure is logged and replaced by the fallback
//! [`StatusRecord`], so the status file is fresh after every run. The
//! original error is still returned so the process can exit non-zero.

use crate::api::AskAsync;
use crate::classifier;
use crate::config::Config;
use crate::error::PipelineError;
use crate::models::{ClassificationResult, StatusRecord};
use crate::outputs::json;
use crate::sources::newsapi;
use crate::utils::truncate_for_log;
use chrono::{Duration, Utc};
use reqwest::Client;
use std::time::Duration as StdDuration;
use tracing::{error, info, instrument};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Build the HTTP client shared by both API calls.
pub fn http_client(config: &Config) -> Result<Client, PipelineError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(config.timeout)
        .build()
        .map_err(|e| PipelineError::Config(format!("could not build HTTP client: {e}")))
}

/// Run the pipeline once and write the status file.
///
/// Returns the record that was written on success. On a fetch or classify
/// failure the fallback record is written and the stage error is returned.
/// A failure to write the status file is returned as
/// [`PipelineError::Write`].
#[instrument(level = "info", skip_all, fields(status_file = %config.status_file.display()))]
pub async fn run<A: AskAsync>(
    http: &Client,
    config: &Config,
    asker: &A,
) -> Result<StatusRecord, PipelineError> {
    match analyze(http, config, asker).await {
        Ok(result) => {
            let record = StatusRecord::from_classification(result);
            json::write_status(&record, &config.status_file).await?;
            Ok(record)
        }
        Err(e) => {
            if let PipelineError::Parse { raw, .. } = &e {
                error!(raw = %truncate_for_log(raw, 1000), "Unparseable model output");
            }
            error!(error = %e, "Pipeline failed; writing fallback status");
            let fallback = StatusRecord::fallback();
            if let Err(write_err) = json::write_status(&fallback, &config.status_file).await {
                error!(error = %write_err, "Failed to write fallback status");
                return Err(write_err);
            }
            Err(e)
        }
    }
}

async fn analyze<A: AskAsync>(
    http: &Client,
    config: &Config,
    asker: &A,
) -> Result<ClassificationResult, PipelineError> {
    // NewsAPI reads `from` as a UTC date.
    let from = Utc::now().date_naive() - Duration::days(1);
    let headlines = newsapi::fetch_headlines(http, config, from).await?;
    info!(count = headlines.len(), "Classifying headlines");
    classifier::classify(asker, &headlines).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AnthropicClient;
    use crate::config::test_config;
    use crate::models::{FALLBACK_TAGLINE, HeadlineRef, Status};
    use chrono::DateTime;
    use mockito::{Matcher, Mock, ServerGuard};
    use serde_json::json;

    const MODEL_TEXT: &str = r#"{"status":"no","tagline":"Quiet day, allegedly.","headlines":[{"title":"A","url":"u1","source":"S1"},{"title":"B","url":"u2","source":"S2"}]}"#;

    async fn mock_news(server: &mut ServerGuard, body: serde_json::Value) -> Mock {
        server
            .mock("GET", "/everything")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    async fn mock_model(server: &mut ServerGuard, text: &str) -> Mock {
        server
            .mock("POST", "/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"content": [{"type": "text", "text": text}]}).to_string())
            .create_async()
            .await
    }

    fn three_articles() -> serde_json::Value {
        json!({
            "status": "ok",
            "articles": [
                {"title": "A - S1", "url": "u1", "source": {"name": "S1"}, "description": "first"},
                {"title": "B - S2", "url": "u2", "source": {"name": "S2"}, "description": null},
                {"title": "C - S3", "url": "u3", "source": {"name": "S3"}}
            ]
        })
    }

    fn read_record(config: &Config) -> StatusRecord {
        let text = std::fs::read_to_string(&config.status_file).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn test_success_writes_classification() {
        let mut server = mockito::Server::new_async().await;
        let news = mock_news(&mut server, three_articles()).await;
        let model = mock_model(&mut server, MODEL_TEXT).await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server.url(), &server.url(), dir.path().join("status.json"));
        let http = http_client(&config).unwrap();
        let asker = AnthropicClient::new(&http, &config);

        let before = Utc::now();
        let record = run(&http, &config, &asker).await.unwrap();
        news.assert_async().await;
        model.assert_async().await;

        let written = read_record(&config);
        assert_eq!(written, record);
        assert_eq!(written.status, Status::No);
        assert_eq!(written.tagline, "Quiet day, allegedly.");
        assert_eq!(
            written.headlines,
            vec![
                HeadlineRef {
                    title: "A".to_string(),
                    url: "u1".to_string(),
                    source: "S1".to_string(),
                },
                HeadlineRef {
                    title: "B".to_string(),
                    url: "u2".to_string(),
                    source: "S2".to_string(),
                },
            ]
        );
        let updated = DateTime::parse_from_rfc3339(&written.updated).unwrap();
        assert!(updated.with_timezone(&Utc) >= before - Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_zero_articles_writes_fallback() {
        let mut server = mockito::Server::new_async().await;
        let _news = mock_news(&mut server, json!({"status": "ok", "articles": []})).await;
        let model = server
            .mock("POST", "/messages")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server.url(), &server.url(), dir.path().join("status.json"));
        let http = http_client(&config).unwrap();
        let asker = AnthropicClient::new(&http, &config);

        let err = run(&http, &config, &asker).await.unwrap_err();
        assert!(matches!(err, PipelineError::Fetch(_)));
        model.assert_async().await;

        let written = read_record(&config);
        assert_eq!(written.status, Status::Unclear);
        assert_eq!(written.tagline, FALLBACK_TAGLINE);
        assert!(written.headlines.is_empty());
    }

    #[tokio::test]
    async fn test_all_articles_filtered_writes_fallback() {
        let mut server = mockito::Server::new_async().await;
        let news = mock_news(
            &mut server,
            json!({
                "status": "ok",
                "articles": [
                    {"title": null, "url": "u1", "source": {"name": "S1"}},
                    {"title": "B - S2", "url": "", "source": {"name": "S2"}},
                    {"title": "C - S3", "url": "u3", "source": {"id": null, "name": null}}
                ]
            }),
        )
        .await;
        let model = server
            .mock("POST", "/messages")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server.url(), &server.url(), dir.path().join("status.json"));
        let http = http_client(&config).unwrap();
        let asker = AnthropicClient::new(&http, &config);

        let err = run(&http, &config, &asker).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation { field: "headlines", .. }));
        news.assert_async().await;
        model.assert_async().await;

        let written = read_record(&config);
        assert_eq!(written.status, Status::Unclear);
        assert_eq!(written.tagline, FALLBACK_TAGLINE);
        assert!(written.headlines.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_model_output_overwrites_previous_status() {
        let mut server = mockito::Server::new_async().await;
        let _news = mock_news(&mut server, three_articles()).await;
        let _model = mock_model(
            &mut server,
            r#"{"status":"maybe","tagline":"Hm.","headlines":[{"title":"A","url":"u1","source":"S1"}]}"#,
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server.url(), &server.url(), dir.path().join("status.json"));
        std::fs::write(
            &config.status_file,
            r#"{"status":"yes","tagline":"Old news.","updated":"2020-01-01T00:00:00.000Z","headlines":[]}"#,
        )
        .unwrap();
        let http = http_client(&config).unwrap();
        let asker = AnthropicClient::new(&http, &config);

        let err = run(&http, &config, &asker).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation { field: "status", .. }));

        let written = read_record(&config);
        assert_eq!(written.status, Status::Unclear);
        assert_eq!(written.tagline, FALLBACK_TAGLINE);
        assert_ne!(written.updated, "2020-01-01T00:00:00.000Z");
    }

    #[tokio::test]
    async fn test_completion_failure_writes_fallback() {
        let mut server = mockito::Server::new_async().await;
        let _news = mock_news(&mut server, three_articles()).await;
        let _model = server
            .mock("POST", "/messages")
            .with_status(500)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server.url(), &server.url(), dir.path().join("status.json"));
        let http = http_client(&config).unwrap();
        let asker = AnthropicClient::new(&http, &config);

        let err = run(&http, &config, &asker).await.unwrap_err();
        assert!(matches!(err, PipelineError::Call(_)));
        assert_eq!(read_record(&config).tagline, FALLBACK_TAGLINE);
    }

    #[tokio::test]
    async fn test_repeat_runs_differ_only_in_timestamp() {
        let mut server = mockito::Server::new_async().await;
        let _news = mock_news(&mut server, three_articles()).await;
        let _model = mock_model(&mut server, MODEL_TEXT).await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server.url(), &server.url(), dir.path().join("status.json"));
        let http = http_client(&config).unwrap();
        let asker = AnthropicClient::new(&http, &config);

        let first = run(&http, &config, &asker).await.unwrap();
        let second = run(&http, &config, &asker).await.unwrap();

        assert_eq!(
            StatusRecord {
                updated: String::new(),
                ..first
            },
            StatusRecord {
                updated: String::new(),
                ..second
            }
        );
    }
}
