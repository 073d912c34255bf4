//! Annotation endpoints
//!
//! POST /api/annotate, GET /api/annotation/:trackId

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use resonote_common::{time, AnnotationRecord, SaveAnnotationResponse, SelectionMap};
use serde::{Deserialize, Deserializer};

use crate::{
    annotations::is_valid_track_id,
    error::{ApiError, ApiResult},
    AppState,
};

/// POST /api/annotate request
///
/// Both fields are optional here so that a missing field is reported as a
/// 400 with a readable message rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct SaveAnnotationRequest {
    #[serde(default, deserialize_with = "deserialize_request_id")]
    pub track_id: Option<String>,
    pub selections: Option<SelectionMap>,
}

/// Numeric ids are accepted and stored under their decimal form; any other
/// non-string value counts as missing
fn deserialize_request_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(id)) => Some(id),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// POST /api/annotate
///
/// Writes the track's record and updates the index. Replays overwrite.
pub async fn save_annotation(
    State(state): State<AppState>,
    payload: Result<Json<SaveAnnotationRequest>, JsonRejection>,
) -> ApiResult<Json<SaveAnnotationResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected annotation body");
        ApiError::BadRequest(rejection.body_text())
    })?;

    let (track_id, selections) = match (request.track_id, request.selections) {
        (Some(track_id), Some(selections)) if !track_id.is_empty() => (track_id, selections),
        _ => {
            return Err(ApiError::BadRequest(
                "track_id and selections required".to_string(),
            ))
        }
    };

    if !is_valid_track_id(&track_id) {
        return Err(ApiError::BadRequest(format!("Invalid track_id: {:?}", track_id)));
    }

    state
        .annotations
        .save(&track_id, selections, time::now())
        .await
        .map_err(|e| {
            tracing::error!(track_id = %track_id, error = %e, "Failed to save annotation");
            ApiError::Internal("Failed to save annotation".to_string())
        })?;

    Ok(Json(SaveAnnotationResponse { ok: true }))
}

/// GET /api/annotation/:trackId
///
/// Returns the stored record, or `null` when the track has no annotation yet.
pub async fn get_annotation(
    State(state): State<AppState>,
    Path(track_id): Path<String>,
) -> ApiResult<Json<Option<AnnotationRecord>>> {
    if !is_valid_track_id(&track_id) {
        return Err(ApiError::BadRequest(format!("Invalid track_id: {:?}", track_id)));
    }

    let record = state.annotations.load(&track_id).await.map_err(|e| {
        tracing::error!(track_id = %track_id, error = %e, "Failed to read annotation");
        ApiError::Internal("Failed to read annotation".to_string())
    })?;

    tracing::debug!(track_id = %track_id, found = record.is_some(), "Annotation lookup");
    Ok(Json(record))
}

/// Build annotation routes
pub fn annotation_routes() -> Router<AppState> {
    Router::new()
        .route("/api/annotate", post(save_annotation))
        .route("/api/annotation/:track_id", get(get_annotation))
}
