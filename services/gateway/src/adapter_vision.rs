use async_trait::async_trait;
use serde::Deserialize;
use signals::{DetectionSignal, MediaSubmission, SignalSource};
use tracing::warn;

use crate::adapter::{AdapterOutcome, SignalAdapter};
use crate::config::VisionConfig;

/// Cloud vision/speech provider. Ships the raw bytes and maps the
/// provider's calibrated score into a signal; every failure mode (network,
/// auth, quota, decode) degrades to `Unavailable`.
pub struct VisionAdapter {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct VisionResponse {
    /// Calibrated authenticity score in [0, 1].
    score: f64,
    model: Option<String>,
}

impl VisionAdapter {
    pub fn new(cfg: VisionConfig, client: reqwest::Client) -> Self {
        Self {
            endpoint: cfg.endpoint,
            api_key: cfg.api_key,
            client,
        }
    }

    async fn fetch(&self, submission: &MediaSubmission) -> anyhow::Result<DetectionSignal> {
        let url = format!(
            "{}/v1/analyze?kind={}",
            self.endpoint.trim_end_matches('/'),
            submission.kind
        );
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(submission.bytes.clone())
            .send()
            .await?
            .error_for_status()?;

        let body: VisionResponse = resp.json().await?;
        let model = body.model.unwrap_or_else(|| "cloud-vision/unversioned".to_string());
        Ok(DetectionSignal::available(
            SignalSource::CloudVision,
            body.score,
            model,
        ))
    }
}

#[async_trait]
impl SignalAdapter for VisionAdapter {
    fn source(&self) -> SignalSource {
        SignalSource::CloudVision
    }

    async fn check(&self, submission: &MediaSubmission) -> AdapterOutcome {
        match self.fetch(submission).await {
            Ok(signal) => AdapterOutcome::Signal(signal),
            Err(e) => {
                warn!(error = %e, "cloud vision check degraded");
                AdapterOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}
