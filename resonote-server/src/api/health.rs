//! Health check endpoint
//!
//! Reports build identity, uptime and whether the data root can serve
//! annotation sessions. Missing documents make the status "degraded" but the
//! endpoint itself always answers 200.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

use crate::AppState;

/// Readiness of the data root
#[derive(Debug, Serialize)]
pub struct DataHealth {
    pub tags_present: bool,
    pub tracks_present: bool,
    /// Index total; absent when the index cannot be read
    pub annotations: Option<usize>,
}

impl DataHealth {
    fn ready(&self) -> bool {
        self.tags_present && self.tracks_present && self.annotations.is_some()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" or "degraded"
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    /// Short git hash captured by build.rs
    pub build: &'static str,
    pub uptime_seconds: u64,
    pub data: DataHealth,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let layout = state.annotations.layout();
    let data = DataHealth {
        tags_present: is_file(&layout.tags_path()).await,
        tracks_present: is_file(&layout.tracks_path()).await,
        annotations: state.annotations.load_index().await.ok().map(|index| index.total),
    };

    if !data.ready() {
        tracing::warn!(?data, "Data root not ready");
    }

    Json(HealthResponse {
        status: if data.ready() { "ok" } else { "degraded" },
        module: "resonote-server",
        version: env!("CARGO_PKG_VERSION"),
        build: env!("GIT_HASH"),
        uptime_seconds: Utc::now()
            .signed_duration_since(state.startup_time)
            .num_seconds()
            .max(0) as u64,
        data,
    })
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
