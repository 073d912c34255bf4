//! Tag/Track store
//!
//! Both documents are read from disk on every call and returned verbatim. No
//! caching: the files are small and requests are rare.

use resonote_common::Result;
use serde_json::Value;
use std::path::Path;

use crate::config::DataLayout;

/// Read-only access to the vocabulary and corpus documents
#[derive(Debug, Clone)]
pub struct CatalogStore {
    layout: DataLayout,
}

impl CatalogStore {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    /// Tag vocabulary document (facet key → ordered tag list)
    pub async fn tags(&self) -> Result<Value> {
        read_document(&self.layout.tags_path()).await
    }

    /// Track corpus document (array of tracks)
    pub async fn tracks(&self) -> Result<Value> {
        read_document(&self.layout.tracks_path()).await
    }
}

async fn read_document(path: &Path) -> Result<Value> {
    let raw = tokio::fs::read_to_string(path).await?;
    let document = serde_json::from_str(&raw)?;
    tracing::debug!(path = %path.display(), bytes = raw.len(), "Loaded document");
    Ok(document)
}
