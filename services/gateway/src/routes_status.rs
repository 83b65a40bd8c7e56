use axum::extract::State;
use axum::Json;
use serde_json::json;
use signals::SignalSource;

use crate::state::SharedState;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": "truthscan-gateway" }))
}

pub async fn status(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let kinds: Vec<&str> = state
        .detectors
        .supported_kinds()
        .into_iter()
        .map(|k| k.as_str())
        .collect();

    let adapter_enabled = |source: SignalSource| {
        state.adapters.iter().any(|a| a.source() == source)
    };

    Json(json!({
        "service": "truthscan-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "supported_kinds": kinds,
        "adapters": {
            "cloud_vision": adapter_enabled(SignalSource::CloudVision),
            "news_search": adapter_enabled(SignalSource::NewsSearch),
        },
        "policy": state.cfg.policy,
    }))
}
