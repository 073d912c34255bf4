//! Best-effort local persistence across restarts
//!
//! Two timestamped JSON documents live in the state directory: the session
//! snapshot (kept 24 hours) and the text scale preference (kept 7 days).
//! Expired or unreadable documents are discarded on load. Failures are logged
//! and never surface to the annotator.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use resonote_common::time;

use crate::preferences::FontScale;
use crate::session::SessionSnapshot;

pub const SESSION_FILE: &str = "session.json";
pub const FONT_SCALE_FILE: &str = "font_scale.json";

pub const SESSION_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);
pub const FONT_SCALE_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Documents carrying their own save time in Unix milliseconds
pub trait Timestamped {
    fn timestamp_ms(&self) -> i64;
}

impl Timestamped for SessionSnapshot {
    fn timestamp_ms(&self) -> i64 {
        self.timestamp
    }
}

/// Stored text scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedFontScale {
    pub scale: FontScale,
    pub timestamp: i64,
}

impl Timestamped for SavedFontScale {
    fn timestamp_ms(&self) -> i64 {
        self.timestamp
    }
}

/// State directory holding the snapshot and preference files
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform default (`~/.local/share/resonote` on Linux)
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("resonote"))
            .unwrap_or_else(|| PathBuf::from(".resonote"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_session(&self, snapshot: &SessionSnapshot) {
        self.write(SESSION_FILE, snapshot);
    }

    /// Snapshot younger than 24 hours, if any
    pub fn load_session(&self, now_ms: i64) -> Option<SessionSnapshot> {
        self.load_fresh(SESSION_FILE, SESSION_MAX_AGE, now_ms)
    }

    pub fn clear_session(&self) {
        self.remove(SESSION_FILE);
    }

    pub fn save_font_scale(&self, scale: FontScale) {
        self.write(
            FONT_SCALE_FILE,
            &SavedFontScale {
                scale,
                timestamp: time::now_millis(),
            },
        );
    }

    /// Text scale saved within the last 7 days, if any
    pub fn load_font_scale(&self, now_ms: i64) -> Option<FontScale> {
        self.load_fresh::<SavedFontScale>(FONT_SCALE_FILE, FONT_SCALE_MAX_AGE, now_ms)
            .map(|saved| FontScale::new(saved.scale.value()))
    }

    fn load_fresh<T>(&self, name: &str, max_age: Duration, now_ms: i64) -> Option<T>
    where
        T: DeserializeOwned + Timestamped,
    {
        let path = self.dir.join(name);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read local state");
                return None;
            }
        };

        let document: T = match serde_json::from_str(&raw) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable local state");
                self.remove(name);
                return None;
            }
        };

        if time::is_expired(document.timestamp_ms(), max_age, now_ms) {
            tracing::info!(path = %path.display(), "Discarding expired local state");
            self.remove(name);
            return None;
        }

        Some(document)
    }

    fn write<T: Serialize>(&self, name: &str, document: &T) {
        let path = self.dir.join(name);
        let result = std::fs::create_dir_all(&self.dir)
            .map_err(resonote_common::Error::from)
            .and_then(|_| Ok(serde_json::to_string(document)?))
            .and_then(|json| Ok(std::fs::write(&path, json)?));

        match result {
            Ok(()) => tracing::debug!(path = %path.display(), "Saved local state"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to save local state"),
        }
    }

    fn remove(&self, name: &str) {
        let path = self.dir.join(name);
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove local state");
            }
        }
    }
}
