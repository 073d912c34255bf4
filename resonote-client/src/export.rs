//! Client-side export of a session's annotations
//!
//! The bundle is built from the annotations saved in this session only; it
//! never reads back from the server.

use chrono::{DateTime, Utc};
use resonote_common::{SelectionMap, Track};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Local copy of an annotation kept after a successful save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationCopy {
    pub track_id: String,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub selections: SelectionMap,
    pub annotated_at: DateTime<Utc>,
    pub session_id: String,
}

/// Identity of an assigned track, without lyrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedTrack {
    pub track_id: String,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
}

impl From<&Track> for AssignedTrack {
    fn from(track: &Track) -> Self {
        Self {
            track_id: track.track_id.clone(),
            track_name: track.track_name.clone(),
            artist_name: track.artist_name.clone(),
        }
    }
}

/// Downloadable export document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub session_id: String,
    pub completed_at: DateTime<Utc>,
    /// Size of the assigned queue (first pass)
    pub total_tracks: usize,
    /// Successful saves in this session
    pub completed_tracks: usize,
    pub annotations: Vec<AnnotationCopy>,
    pub assigned_tracks: Vec<AssignedTrack>,
}

impl ExportBundle {
    /// `resonote-annotations-<session id>.json`
    pub fn file_name(&self) -> String {
        format!("resonote-annotations-{}.json", self.session_id)
    }

    /// Write the bundle as pretty JSON into `dir`, returning the file path
    pub async fn write_to(&self, dir: &Path) -> resonote_common::Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(self.file_name());
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, json).await?;
        tracing::info!(path = %path.display(), annotations = self.annotations.len(), "Exported annotations");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bundle() -> ExportBundle {
        ExportBundle {
            session_id: "session-1-abc".to_string(),
            completed_at: Utc::now(),
            total_tracks: 1,
            completed_tracks: 1,
            annotations: vec![AnnotationCopy {
                track_id: "t1".to_string(),
                track_name: Some("One".to_string()),
                artist_name: None,
                selections: [("Emotional_Tone".to_string(), vec!["joyful".to_string()])]
                    .into_iter()
                    .collect(),
                annotated_at: Utc::now(),
                session_id: "session-1-abc".to_string(),
            }],
            assigned_tracks: vec![AssignedTrack {
                track_id: "t1".to_string(),
                track_name: Some("One".to_string()),
                artist_name: None,
            }],
        }
    }

    #[test]
    fn test_file_name_uses_session_id() {
        assert_eq!(bundle().file_name(), "resonote-annotations-session-1-abc.json");
    }

    #[tokio::test]
    async fn test_write_to_creates_readable_document() {
        let temp = TempDir::new().unwrap();
        let export_dir = temp.path().join("exports");
        let bundle = bundle();

        let path = bundle.write_to(&export_dir).await.unwrap();
        assert_eq!(path, export_dir.join(bundle.file_name()));

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: ExportBundle = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, bundle);
    }
}
