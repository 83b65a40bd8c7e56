use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use ledger::{hash_from_hex, DIGEST_VERSION};
use serde_json::json;

use crate::state::SharedState;

/// Registry lookup by hex content hash.
pub async fn get_registration(
    State(state): State<SharedState>,
    Path(hash_hex): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let hash = hash_from_hex(&hash_hex).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "hash must be 64 hex characters" })),
        )
    })?;

    let entry = state.ledger.get(hash).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    Ok(Json(json!({
        "hash": hash_hex.to_lowercase(),
        "digest": DIGEST_VERSION,
        "registered": entry.is_some(),
        "first_seen_by": entry.as_ref().map(|e| e.uploader.clone()),
        "first_seen_at": entry.map(|e| e.registered_at),
    })))
}
