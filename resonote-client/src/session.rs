//! Annotation session state machine
//!
//! ```text
//! Loading ─load─▶ Ready ◀─toggle─▶ Reviewing ─begin_save─▶ Saving
//!                   ▲                                        │
//!                   └──────── save_succeeded / skip ◀────────┘
//!                                       │
//!                                       ▼
//!                                   Completed
//! ```
//!
//! Every user action is one method on [`Session`]. Methods never touch the
//! network or the terminal: saving is split into [`Session::begin_save`],
//! which hands out the payload to send, and [`Session::save_succeeded`] /
//! [`Session::save_failed`], which apply the outcome. Rendering reads
//! [`Session::view`].

use chrono::{DateTime, Utc};
use rand::Rng;
use resonote_common::{AnnotationPayload, Facet, TagVocabulary, Track};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::export::{AnnotationCopy, AssignedTrack, ExportBundle};
use crate::queue::{self, Advance, TrackQueue};
use crate::search::FacetIndex;
use crate::selections::Selections;
use crate::view::{self, Chip, FacetView, SessionView};

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Waiting for vocabulary and corpus
    Loading,
    /// Track on screen, nothing selected
    Ready,
    /// Track on screen, at least one tag selected
    Reviewing,
    /// Save request in flight; further actions are refused
    Saving,
    /// Queue and pending tracks exhausted
    Completed,
}

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient message for the annotator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

impl From<SessionError> for Notice {
    fn from(error: SessionError) -> Self {
        Notice::warning(error.to_string())
    }
}

/// Refused actions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session is still loading")]
    NotLoaded,

    #[error("Session is already loaded")]
    AlreadyLoaded,

    #[error("No track selected")]
    NoCurrentTrack,

    #[error("Please select at least one tag")]
    EmptySelection,

    #[error("A save is already in progress")]
    SaveInFlight,

    #[error("No save is in progress")]
    NotSaving,

    #[error("\"{tag}\" is not a {facet} tag")]
    UnknownTag { facet: Facet, tag: String },

    #[error("Export is available once all tracks are completed")]
    NotCompleted,
}

/// Persisted session progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    #[serde(default)]
    pub completed_annotations: Vec<AnnotationCopy>,
    #[serde(default)]
    pub assigned_tracks: Vec<Track>,
    #[serde(default)]
    pub pending_tracks: Vec<Track>,
    /// Absent in snapshots taken before any requeue bookkeeping existed
    #[serde(default)]
    pub first_pass_len: Option<usize>,
    #[serde(default)]
    pub current_index: usize,
    #[serde(default)]
    pub progress: usize,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl SessionSnapshot {
    /// Whether any track is still waiting for an annotation
    pub fn has_remaining(&self) -> bool {
        self.current_index < self.assigned_tracks.len() || !self.pending_tracks.is_empty()
    }
}

/// `session-<unix ms>-<9 base36 chars>`
pub fn generate_session_id<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("session-{}-{}", now.timestamp_millis(), suffix)
}

/// Search state of one facet
#[derive(Debug, Clone, Default)]
struct FacetState {
    index: FacetIndex,
    query: String,
    /// Tags currently shown: full vocabulary or the ranked search result
    displayed: Vec<String>,
}

impl FacetState {
    fn new(tags: &[String]) -> Self {
        Self {
            index: FacetIndex::new(tags),
            query: String::new(),
            displayed: tags.to_vec(),
        }
    }

    fn set_query(&mut self, query: &str, vocabulary: &[String]) {
        self.query = query.to_string();
        self.displayed = if query.trim().is_empty() {
            vocabulary.to_vec()
        } else {
            self.index.filter(query)
        };
    }
}

/// One annotation session
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    phase: Phase,
    vocabulary: Arc<TagVocabulary>,
    facets: [FacetState; 4],
    queue: TrackQueue,
    selections: Selections,
    progress: usize,
    completed: Vec<AnnotationCopy>,
}

impl Session {
    /// New session waiting for data
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phase: Phase::Loading,
            vocabulary: Arc::new(TagVocabulary::default()),
            facets: Default::default(),
            queue: TrackQueue::default(),
            selections: Selections::new(),
            progress: 0,
            completed: Vec::new(),
        }
    }

    // ========================================
    // Loading
    // ========================================

    /// Build the queue from a freshly fetched corpus
    ///
    /// Keeps eligible tracks, shuffles them and assigns the first
    /// `queue_size`. An empty assignment completes the session immediately.
    pub fn load<R: Rng + ?Sized>(
        &mut self,
        vocabulary: TagVocabulary,
        corpus: Vec<Track>,
        queue_size: usize,
        rng: &mut R,
    ) -> Result<Vec<Notice>, SessionError> {
        if self.phase != Phase::Loading {
            return Err(SessionError::AlreadyLoaded);
        }

        let corpus_len = corpus.len();
        let eligible = queue::eligible_tracks(corpus);
        let eligible_len = eligible.len();
        let assigned = queue::assign_tracks(eligible, queue_size, rng);

        tracing::info!(
            session_id = %self.id,
            corpus = corpus_len,
            eligible = eligible_len,
            assigned = assigned.len(),
            "Session loaded"
        );

        self.install_vocabulary(vocabulary);
        self.queue = TrackQueue::new(assigned);

        let mut notices = vec![Notice::success("Data loaded successfully!")];
        notices.extend(self.settle());
        Ok(notices)
    }

    /// Resume from a stored snapshot instead of building a new queue
    pub fn restore(
        &mut self,
        vocabulary: TagVocabulary,
        snapshot: SessionSnapshot,
    ) -> Result<Vec<Notice>, SessionError> {
        if self.phase != Phase::Loading {
            return Err(SessionError::AlreadyLoaded);
        }

        let first_pass_len = snapshot
            .first_pass_len
            .unwrap_or(snapshot.assigned_tracks.len());

        self.id = snapshot.session_id;
        self.progress = snapshot.progress;
        self.completed = snapshot.completed_annotations;
        self.install_vocabulary(vocabulary);
        self.queue = TrackQueue::from_parts(
            snapshot.assigned_tracks,
            snapshot.pending_tracks,
            snapshot.current_index,
            first_pass_len,
        );

        tracing::info!(
            session_id = %self.id,
            cursor = self.queue.cursor(),
            progress = self.progress,
            "Session restored from snapshot"
        );

        let mut notices = vec![Notice::info(format!(
            "Resumed session ({} saved)",
            self.progress
        ))];
        notices.extend(self.settle());
        Ok(notices)
    }

    /// Loading failed; the session stays in [`Phase::Loading`]
    pub fn load_failed(&self, error: &dyn std::fmt::Display) -> Notice {
        tracing::error!(session_id = %self.id, error = %error, "Failed to load data");
        Notice::error("Failed to load data. Please restart.")
    }

    fn install_vocabulary(&mut self, vocabulary: TagVocabulary) {
        self.facets = Facet::ALL.map(|facet| FacetState::new(vocabulary.tags(facet)));
        self.vocabulary = Arc::new(vocabulary);
    }

    // ========================================
    // Tag selection and search
    // ========================================

    /// Select or deselect a vocabulary tag. Returns true when now selected.
    pub fn toggle_tag(&mut self, facet: Facet, tag: &str) -> Result<bool, SessionError> {
        self.require_track()?;
        if !self.vocabulary.contains(facet, tag) {
            return Err(SessionError::UnknownTag {
                facet,
                tag: tag.to_string(),
            });
        }

        let selected = self.selections.toggle(facet, tag);
        self.refresh_phase();
        Ok(selected)
    }

    /// Clear every selection and search query
    pub fn clear_selections(&mut self) -> Result<Notice, SessionError> {
        self.require_track()?;
        self.reset_selections();
        Ok(Notice::info("All selections cleared"))
    }

    /// Filter a facet's displayed tags; a blank query shows the full vocabulary
    ///
    /// Selections are untouched, including tags filtered out of view.
    pub fn set_query(&mut self, facet: Facet, query: &str) -> Result<&[String], SessionError> {
        if self.phase == Phase::Loading {
            return Err(SessionError::NotLoaded);
        }
        let state = &mut self.facets[facet.index()];
        state.set_query(query, self.vocabulary.tags(facet));
        Ok(&state.displayed)
    }

    /// Tags currently shown for a facet
    pub fn displayed(&self, facet: Facet) -> &[String] {
        &self.facets[facet.index()].displayed
    }

    // ========================================
    // Skip and save
    // ========================================

    /// Defer the current track to the second pass and show the next one
    pub fn skip(&mut self) -> Result<Vec<Notice>, SessionError> {
        self.require_track()?;

        let advance = self.queue.skip().ok_or(SessionError::NoCurrentTrack)?;
        self.reset_selections();

        let mut notices = vec![Notice::info("Track skipped")];
        notices.extend(self.after_advance(advance));
        Ok(notices)
    }

    /// Validate and enter [`Phase::Saving`], returning the payload to send
    ///
    /// Refused without a current track or without any selection; in both
    /// cases nothing should be sent.
    pub fn begin_save(&mut self) -> Result<AnnotationPayload, SessionError> {
        self.require_track()?;
        let track = self.queue.current().ok_or(SessionError::NoCurrentTrack)?;
        if self.selections.is_empty() {
            return Err(SessionError::EmptySelection);
        }

        let payload = AnnotationPayload {
            track_id: track.track_id.clone(),
            selections: self.selections.to_map(),
        };
        self.phase = Phase::Saving;
        Ok(payload)
    }

    /// The save request succeeded: record it locally and move on
    pub fn save_succeeded(&mut self, now: DateTime<Utc>) -> Result<Vec<Notice>, SessionError> {
        if self.phase != Phase::Saving {
            return Err(SessionError::NotSaving);
        }
        let track = self.queue.current().ok_or(SessionError::NoCurrentTrack)?;

        let tag_count = self.selections.total();
        self.completed.push(AnnotationCopy {
            track_id: track.track_id.clone(),
            track_name: track.track_name.clone(),
            artist_name: track.artist_name.clone(),
            selections: self.selections.to_map(),
            annotated_at: now,
            session_id: self.id.clone(),
        });
        self.progress += 1;

        tracing::info!(
            session_id = %self.id,
            track_id = %track.track_id,
            tags = tag_count,
            progress = self.progress,
            "Annotation saved"
        );

        let advance = self.queue.advance();
        self.reset_selections();

        let mut notices = vec![Notice::success(format!(
            "Annotations saved! ({} tags)",
            tag_count
        ))];
        notices.extend(self.after_advance(advance));
        Ok(notices)
    }

    /// The save request failed: keep the track and its selections for a retry
    pub fn save_failed(&mut self, error: &dyn std::fmt::Display) -> Result<Notice, SessionError> {
        if self.phase != Phase::Saving {
            return Err(SessionError::NotSaving);
        }
        tracing::warn!(session_id = %self.id, error = %error, "Save failed");
        self.phase = Phase::Reviewing;
        self.refresh_phase();
        Ok(Notice::error(format!("Failed to save annotations: {}", error)))
    }

    // ========================================
    // Export and persistence
    // ========================================

    /// Bundle this session's saved annotations; only once completed
    pub fn export(&self, now: DateTime<Utc>) -> Result<ExportBundle, SessionError> {
        if self.phase != Phase::Completed {
            return Err(SessionError::NotCompleted);
        }

        Ok(ExportBundle {
            session_id: self.id.clone(),
            completed_at: now,
            total_tracks: self.queue.first_pass_len(),
            completed_tracks: self.progress,
            annotations: self.completed.clone(),
            assigned_tracks: self.queue.tracks()[..self.queue.first_pass_len()]
                .iter()
                .map(AssignedTrack::from)
                .collect(),
        })
    }

    /// Progress snapshot for the local store; `None` while loading
    pub fn snapshot(&self, now_ms: i64) -> Option<SessionSnapshot> {
        if self.phase == Phase::Loading {
            return None;
        }
        Some(SessionSnapshot {
            session_id: self.id.clone(),
            completed_annotations: self.completed.clone(),
            assigned_tracks: self.queue.tracks().to_vec(),
            pending_tracks: self.queue.pending().to_vec(),
            first_pass_len: Some(self.queue.first_pass_len()),
            current_index: self.queue.cursor(),
            progress: self.progress,
            timestamp: now_ms,
        })
    }

    /// Projection of the current state for rendering
    pub fn view(&self) -> SessionView {
        let facets = Facet::ALL
            .iter()
            .map(|&facet| {
                let state = &self.facets[facet.index()];
                FacetView {
                    facet,
                    query: state.query.clone(),
                    chips: state
                        .displayed
                        .iter()
                        .map(|tag| Chip {
                            tag: tag.clone(),
                            selected: self.selections.is_selected(facet, tag),
                        })
                        .collect(),
                    selected: self.selections.of(facet).len(),
                    available: self.vocabulary.tags(facet).len(),
                }
            })
            .collect();

        let total = self.queue.total();
        let position = match self.phase {
            Phase::Completed => total,
            _ => (self.queue.cursor() + 1).min(total),
        };

        SessionView {
            session_id: self.id.clone(),
            phase: self.phase,
            track: self.current_track().cloned(),
            facets,
            total_selections: self.selections.total(),
            progress: self.progress,
            position,
            total,
            remaining: self.queue.remaining(),
            percent: view::percent(self.queue.cursor(), total),
            on_second_pass: self.queue.on_second_pass(),
        }
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_track(&self) -> Option<&Track> {
        match self.phase {
            Phase::Loading | Phase::Completed => None,
            _ => self.queue.current(),
        }
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    pub fn vocabulary(&self) -> &TagVocabulary {
        &self.vocabulary
    }

    pub fn query(&self, facet: Facet) -> &str {
        &self.facets[facet.index()].query
    }

    pub fn queue(&self) -> &TrackQueue {
        &self.queue
    }

    /// Successful saves in this session
    pub fn progress(&self) -> usize {
        self.progress
    }

    pub fn completed_annotations(&self) -> &[AnnotationCopy] {
        &self.completed
    }

    // ========================================
    // Internals
    // ========================================

    /// Actions that need a track on screen and no save in flight
    fn require_track(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Loading => Err(SessionError::NotLoaded),
            Phase::Saving => Err(SessionError::SaveInFlight),
            Phase::Completed => Err(SessionError::NoCurrentTrack),
            Phase::Ready | Phase::Reviewing => Ok(()),
        }
    }

    fn reset_selections(&mut self) {
        self.selections.clear();
        for facet in Facet::ALL {
            self.facets[facet.index()].set_query("", self.vocabulary.tags(facet));
        }
        self.refresh_phase();
    }

    /// Ready/Reviewing follow the selection count
    fn refresh_phase(&mut self) {
        if matches!(self.phase, Phase::Ready | Phase::Reviewing) {
            self.phase = if self.selections.is_empty() {
                Phase::Ready
            } else {
                Phase::Reviewing
            };
        }
    }

    fn settle(&mut self) -> Vec<Notice> {
        let advance = self.queue.settle();
        self.after_advance(advance)
    }

    fn after_advance(&mut self, advance: Advance) -> Vec<Notice> {
        match advance {
            Advance::Next => {
                self.phase = Phase::Ready;
                self.refresh_phase();
                Vec::new()
            }
            Advance::Requeued(count) => {
                self.phase = Phase::Ready;
                self.refresh_phase();
                tracing::info!(session_id = %self.id, count, "Requeued skipped tracks");
                vec![Notice::info("Showing skipped tracks")]
            }
            Advance::Exhausted => {
                self.phase = Phase::Completed;
                tracing::info!(
                    session_id = %self.id,
                    progress = self.progress,
                    dropped = self.queue.dropped().len(),
                    "Session completed"
                );
                vec![Notice::success(
                    "All tracks completed! You can now export your annotations.",
                )]
            }
        }
    }
}
