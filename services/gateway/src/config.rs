use std::time::Duration;

use anyhow::{bail, Context, Result};
use verdict::{ScorePolicy, SignalWeights, VerdictThresholds};

#[derive(Clone, Debug)]
pub struct VisionConfig {
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Clone, Debug)]
pub struct NewsConfig {
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
    pub adapter_timeout: Duration,
    pub video_max_frames: usize,
    pub policy: ScorePolicy,

    /// External adapters stay disabled until both endpoint and key exist.
    pub vision: Option<VisionConfig>,
    pub news: Option<NewsConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = get("DATABASE_URL")?;
        let bind_addr =
            std::env::var("GATEWAY_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", 100 * 1024 * 1024)?;
        let adapter_timeout_secs: u64 = parse_or("ADAPTER_TIMEOUT_SECS", 10)?;
        let video_max_frames = parse_or("VIDEO_MAX_FRAMES", 30)?;

        let weights = SignalWeights {
            local: parse_or("TRUST_WEIGHT_LOCAL", SignalWeights::default().local)?,
            cloud: parse_or("TRUST_WEIGHT_CLOUD", SignalWeights::default().cloud)?,
            news: parse_or("TRUST_WEIGHT_NEWS", SignalWeights::default().news)?,
        };
        let thresholds = VerdictThresholds {
            real_min: parse_or("VERDICT_REAL_MIN", VerdictThresholds::default().real_min)?,
            fake_max: parse_or("VERDICT_FAKE_MAX", VerdictThresholds::default().fake_max)?,
        };

        let vision = optional_pair("VISION_ENDPOINT", "VISION_API_KEY")
            .map(|(endpoint, api_key)| VisionConfig { endpoint, api_key });
        let news = optional_pair("NEWS_ENDPOINT", "NEWS_API_KEY")
            .map(|(endpoint, api_key)| NewsConfig { endpoint, api_key });

        // Tiny sanity checks (fail fast, fail loud)
        if weights.local <= 0.0 || weights.cloud <= 0.0 || weights.news <= 0.0 {
            bail!("TRUST_WEIGHT_* values must all be positive");
        }
        if thresholds.real_min <= thresholds.fake_max {
            bail!("VERDICT_REAL_MIN must be greater than VERDICT_FAKE_MAX");
        }
        if !(1..=120).contains(&adapter_timeout_secs) {
            bail!("ADAPTER_TIMEOUT_SECS must be between 1 and 120");
        }
        if let Some(v) = &vision {
            check_url("VISION_ENDPOINT", &v.endpoint)?;
        }
        if let Some(n) = &news {
            check_url("NEWS_ENDPOINT", &n.endpoint)?;
        }

        Ok(Self {
            database_url,
            bind_addr,
            max_upload_bytes,
            adapter_timeout: Duration::from_secs(adapter_timeout_secs),
            video_max_frames,
            policy: ScorePolicy {
                weights,
                thresholds,
            },
            vision,
            news,
        })
    }
}

fn get(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Missing required env var: {key}"))
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw}")),
        Err(_) => Ok(default),
    }
}

fn optional_pair(endpoint_key: &str, api_key_key: &str) -> Option<(String, String)> {
    let endpoint = std::env::var(endpoint_key).ok().filter(|v| !v.is_empty())?;
    let api_key = std::env::var(api_key_key).ok().filter(|v| !v.is_empty())?;
    Some((endpoint, api_key))
}

fn check_url(key: &str, url: &str) -> Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        bail!("{key} must start with http:// or https://");
    }
    Ok(())
}
