use std::sync::Arc;

use detectors::{DetectorRegistry, VideoDetector};
use ledger::LedgerStore;
use sqlx::PgPool;

use crate::adapter::SignalAdapter;
use crate::adapter_news::NewsAdapter;
use crate::adapter_vision::VisionAdapter;
use crate::config::AppConfig;
use crate::pg_ledger::PgLedger;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub cfg: AppConfig,
    pub pg_pool: PgPool,
    pub detectors: Arc<DetectorRegistry>,
    pub ledger: Arc<dyn LedgerStore>,
    pub adapters: Vec<Arc<dyn SignalAdapter>>,
}

impl AppState {
    pub fn new(cfg: AppConfig, pg_pool: PgPool) -> anyhow::Result<Self> {
        let mut registry = DetectorRegistry::with_defaults();
        registry.register(Box::new(VideoDetector::new(cfg.video_max_frames)));

        // One outbound client; the adapter timeout also caps connect time.
        let client = reqwest::Client::builder()
            .timeout(cfg.adapter_timeout)
            .build()?;

        let mut adapters: Vec<Arc<dyn SignalAdapter>> = Vec::new();
        if let Some(vision) = cfg.vision.clone() {
            adapters.push(Arc::new(VisionAdapter::new(vision, client.clone())));
        }
        if let Some(news) = cfg.news.clone() {
            adapters.push(Arc::new(NewsAdapter::new(news, client)));
        }

        Ok(Self {
            ledger: Arc::new(PgLedger::new(pg_pool.clone())),
            detectors: Arc::new(registry),
            adapters,
            cfg,
            pg_pool,
        })
    }
}
