use async_trait::async_trait;
use serde::Deserialize;
use signals::{DetectionSignal, MediaSubmission, SignalSource};
use tracing::warn;

use crate::adapter::{AdapterOutcome, SignalAdapter};
use crate::config::NewsConfig;

const MODEL_ID: &str = "news-search/1.0";

/// Score when the search ran but matched nothing: absence of news coverage
/// is neutral, not evidence of fakery.
const NEUTRAL_SCORE: f64 = 0.5;

/// Articles counted toward the score and returned as references.
const MAX_ARTICLES: u64 = 5;

/// Cross-references the submission's descriptive text against a news
/// index. Matching coverage is corroborating evidence and raises the
/// score; an empty result stays neutral.
pub struct NewsAdapter {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct NewsResponse {
    #[serde(rename = "totalResults", default)]
    total_results: u64,
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

#[derive(Deserialize, serde::Serialize)]
struct NewsArticle {
    title: String,
    url: String,
}

impl NewsAdapter {
    pub fn new(cfg: NewsConfig, client: reqwest::Client) -> Self {
        Self {
            endpoint: cfg.endpoint,
            api_key: cfg.api_key,
            client,
        }
    }

    async fn fetch(&self, query: &str) -> anyhow::Result<DetectionSignal> {
        let url = format!(
            "{}/v2/everything?q={}&pageSize={}",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(query),
            MAX_ARTICLES
        );
        let resp = self
            .client
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?
            .error_for_status()?;

        let body: NewsResponse = resp.json().await?;
        let refs: Vec<&NewsArticle> = body.articles.iter().take(MAX_ARTICLES as usize).collect();

        let signal = DetectionSignal::available(
            SignalSource::NewsSearch,
            news_score(body.total_results),
            MODEL_ID,
        )
        .with_metadata(serde_json::json!({
            "matched": body.total_results,
            "articles": refs,
        }));
        Ok(signal)
    }
}

fn news_score(matched: u64) -> f64 {
    if matched == 0 {
        NEUTRAL_SCORE
    } else {
        (NEUTRAL_SCORE + 0.1 * matched.min(MAX_ARTICLES) as f64).min(1.0)
    }
}

#[async_trait]
impl SignalAdapter for NewsAdapter {
    fn source(&self) -> SignalSource {
        SignalSource::NewsSearch
    }

    async fn check(&self, submission: &MediaSubmission) -> AdapterOutcome {
        let Some(query) = submission
            .metadata_text
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
        else {
            return AdapterOutcome::Unavailable {
                reason: "no metadata text supplied".to_string(),
            };
        };

        match self.fetch(query).await {
            Ok(signal) => AdapterOutcome::Signal(signal),
            Err(e) => {
                warn!(error = %e, "news search check degraded");
                AdapterOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signals::MediaKind;

    #[test]
    fn no_coverage_is_neutral() {
        assert_eq!(news_score(0), 0.5);
    }

    #[tokio::test]
    async fn missing_metadata_is_unavailable_without_network() {
        let adapter = NewsAdapter::new(
            NewsConfig {
                endpoint: "http://news.invalid".to_string(),
                api_key: "k".to_string(),
            },
            reqwest::Client::new(),
        );
        let submission = MediaSubmission::new(vec![1, 2, 3], MediaKind::Image, "alice");

        match adapter.check(&submission).await {
            AdapterOutcome::Unavailable { reason } => {
                assert!(reason.contains("no metadata text"))
            }
            AdapterOutcome::Signal(_) => panic!("expected unavailable"),
        }

        let blank = MediaSubmission::new(vec![1], MediaKind::Image, "alice")
            .with_metadata_text("   ");
        assert!(matches!(
            adapter.check(&blank).await,
            AdapterOutcome::Unavailable { .. }
        ));
    }

    #[test]
    fn coverage_raises_score_up_to_cap() {
        assert!((news_score(1) - 0.6).abs() < 1e-9);
        assert!((news_score(3) - 0.8).abs() < 1e-9);
        assert!((news_score(5) - 1.0).abs() < 1e-9);
        assert!((news_score(5000) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn coverage_is_strictly_above_neutral() {
        for matched in 1..10 {
            assert!(news_score(matched) > NEUTRAL_SCORE);
        }
    }
}
