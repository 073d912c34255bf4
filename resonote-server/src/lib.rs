//! resonote-server library
//!
//! Serves the tag vocabulary and track corpus, persists one annotation record
//! per track, and serves the static front end from a public root.

use axum::{extract::DefaultBodyLimit, Router};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod annotations;
pub mod api;
pub mod config;
pub mod error;
pub mod store;

pub use crate::annotations::AnnotationStore;
pub use crate::config::DataLayout;
pub use crate::error::{ApiError, ApiResult};
pub use crate::store::CatalogStore;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Vocabulary and corpus documents
    pub catalog: Arc<CatalogStore>,
    /// Annotation records and index
    pub annotations: Arc<AnnotationStore>,
    /// Root of the static files served for unmatched paths
    pub public_dir: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(layout: DataLayout, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog: Arc::new(CatalogStore::new(layout.clone())),
            annotations: Arc::new(AnnotationStore::new(layout)),
            public_dir: public_dir.into(),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// API routes first; every other path falls through to the static files.
pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.public_dir);

    Router::new()
        .merge(api::catalog_routes())
        .merge(api::annotation_routes())
        .merge(api::health_routes())
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
