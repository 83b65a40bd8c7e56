use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::results_store::{self, internal_error};
use crate::state::SharedState;

pub async fn get_result(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let row = results_store::fetch_report(&state.pg_pool, id)
        .await
        .map_err(internal_error)?;

    if let Some(r) = row {
        Ok(Json(serde_json::json!({
            "id": r.id,
            "uploader": r.uploader,
            "kind": r.kind,
            "created_at": r.created_at,
            "report": r.report,
        })))
    } else {
        Err((StatusCode::NOT_FOUND, "Result not found".to_string()))
    }
}

#[derive(Deserialize)]
pub struct HistoryParams {
    pub uploader: String,
    pub limit: Option<i64>,
}

pub async fn get_history(
    State(state): State<SharedState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<results_store::HistoryRow>>, (StatusCode, String)> {
    let limit = params.limit.unwrap_or(100).clamp(1, 500);
    let rows = results_store::history(&state.pg_pool, &params.uploader, limit)
        .await
        .map_err(internal_error)?;
    Ok(Json(rows))
}
