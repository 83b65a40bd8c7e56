use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use signals::{MediaKind, MediaSubmission};
use tracing::info;
use uuid::Uuid;

use crate::pipeline::{run_analysis, AnalyzeError};
use crate::results_store;
use crate::state::SharedState;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg.into() })))
}

pub async fn analyze(
    State(state): State<SharedState>,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let mut file_bytes: Option<bytes::Bytes> = None;
    let mut kind: Option<String> = None;
    let mut uploader: Option<String> = None;
    let mut metadata: Option<String> = None;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        match field.name() {
            Some("file") => {
                file_bytes = Some(field.bytes().await.map_err(|e| bad_request(e.to_string()))?)
            }
            Some("kind") => {
                kind = Some(field.text().await.map_err(|e| bad_request(e.to_string()))?)
            }
            Some("uploader") => {
                uploader = Some(field.text().await.map_err(|e| bad_request(e.to_string()))?)
            }
            Some("metadata") => {
                metadata = Some(field.text().await.map_err(|e| bad_request(e.to_string()))?)
            }
            _ => {}
        }
    }

    let bytes = file_bytes.ok_or_else(|| bad_request("missing file field"))?;
    if bytes.is_empty() {
        return Err(bad_request("empty file"));
    }
    if bytes.len() > state.cfg.max_upload_bytes {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({ "error": "file exceeds upload limit" })),
        ));
    }

    let kind_raw = kind.ok_or_else(|| bad_request("missing kind field"))?;
    let kind = MediaKind::parse(&kind_raw)
        .ok_or_else(|| bad_request(format!("unsupported media kind: {kind_raw}")))?;

    let uploader = uploader
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| bad_request("missing uploader field"))?;

    let mut submission = MediaSubmission::new(bytes.to_vec(), kind, uploader.clone());
    if let Some(text) = metadata.filter(|t| !t.trim().is_empty()) {
        submission = submission.with_metadata_text(text);
    }

    info!(%kind, uploader, size = submission.size, "analysis request");

    let report = run_analysis(&state, submission)
        .await
        .map_err(|e| match e {
            AnalyzeError::UnsupportedMedia(reason) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                Json(json!({ "error": format!("unsupported media: {reason}") })),
            ),
            AnalyzeError::NoSignal(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "no signal sources available" })),
            ),
            AnalyzeError::Ledger(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ),
        })?;

    let mut body = serde_json::to_value(&report).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    let id = Uuid::new_v4();
    results_store::insert_report(
        &state.pg_pool,
        id,
        &uploader,
        kind.as_str(),
        &report,
        body.clone(),
    )
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    if let Some(obj) = body.as_object_mut() {
        obj.insert("result_id".to_string(), json!(id));
    }

    Ok((StatusCode::CREATED, Json(body)))
}
