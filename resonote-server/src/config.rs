//! On-disk layout of the data root

use std::path::{Path, PathBuf};

/// Tag vocabulary document, keyed by facet
pub const TAGS_FILE: &str = "all_unique_tags_cleaned_human_reviewed.json";
/// Track corpus document (JSON array)
pub const TRACKS_FILE: &str = "eval.json";
/// Directory of per-track annotation records
pub const ANNOTATIONS_DIR: &str = "annotations";
/// Index document inside [`ANNOTATIONS_DIR`]
pub const INDEX_FILE: &str = "_index.json";

/// Paths of every file the server reads or writes under its data root
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tags_path(&self) -> PathBuf {
        self.root.join(TAGS_FILE)
    }

    pub fn tracks_path(&self) -> PathBuf {
        self.root.join(TRACKS_FILE)
    }

    pub fn annotations_dir(&self) -> PathBuf {
        self.root.join(ANNOTATIONS_DIR)
    }

    pub fn index_path(&self) -> PathBuf {
        self.annotations_dir().join(INDEX_FILE)
    }

    /// Absolute location of a track's record file
    pub fn record_path(&self, track_id: &str) -> PathBuf {
        self.annotations_dir().join(format!("{}.json", track_id))
    }

    /// Record location as stored in the index, relative to the data root
    pub fn record_relative_path(track_id: &str) -> String {
        format!("{}/{}.json", ANNOTATIONS_DIR, track_id)
    }
}
