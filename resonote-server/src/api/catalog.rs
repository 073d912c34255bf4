//! Vocabulary and corpus endpoints
//!
//! GET /api/tags, GET /api/tracks

use axum::{extract::State, routing::get, Json, Router};
use serde_json::Value;

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// GET /api/tags
///
/// Returns the tag vocabulary document unchanged.
pub async fn get_tags(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.catalog.tags().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "Failed to load tags");
        ApiError::Internal("Failed to load tags".to_string())
    })
}

/// GET /api/tracks
///
/// Returns the full track corpus unchanged, eligible or not.
pub async fn get_tracks(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.catalog.tracks().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "Failed to load tracks");
        ApiError::Internal("Failed to load tracks".to_string())
    })
}

/// Build catalog routes
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tags", get(get_tags))
        .route("/api/tracks", get(get_tracks))
}
