//! Annotation driver: runs commands against the session and the backend
//!
//! The terminal loop in `main.rs` feeds parsed [`Command`]s into
//! [`Annotator::handle`] and prints the [`Reply`]. Network calls, the export
//! file and the local store are handled here; the session itself stays pure.

use rand::rngs::StdRng;
use rand::SeedableRng;
use resonote_common::time;
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::{self, AnnotationBackend};
use crate::commands::{Command, TagRef, HELP};
use crate::local_store::LocalStore;
use crate::preferences::FontScale;
use crate::queue::DEFAULT_QUEUE_SIZE;
use crate::session::{generate_session_id, Notice, Phase, Session};
use crate::view;

/// Pause after a successful save so the notice is seen before the next track
pub const SAVE_DISPLAY_DELAY: Duration = Duration::from_millis(800);

/// Lyrics column width at 100% text scale
pub const BASE_WIDTH: usize = 72;

#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
    pub queue_size: usize,
    /// Fixed seed for a reproducible shuffle
    pub seed: Option<u64>,
    /// Ignore any stored snapshot
    pub fresh: bool,
    pub export_dir: PathBuf,
    pub save_delay: Duration,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
            seed: None,
            fresh: false,
            export_dir: PathBuf::from("."),
            save_delay: SAVE_DISPLAY_DELAY,
        }
    }
}

/// Outcome of one command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub notices: Vec<Notice>,
    /// Wait this long after printing notices before redrawing
    pub delay_render: Option<Duration>,
    pub quit: bool,
}

impl Reply {
    fn notices(notices: Vec<Notice>) -> Self {
        Self {
            notices,
            ..Self::default()
        }
    }

    fn notice(notice: Notice) -> Self {
        Self::notices(vec![notice])
    }
}

pub struct Annotator<B: AnnotationBackend> {
    backend: B,
    store: LocalStore,
    config: AnnotatorConfig,
    session: Session,
    font_scale: FontScale,
    rng: StdRng,
    /// Set after a quit was refused for unsaved selections
    quit_armed: bool,
}

impl<B: AnnotationBackend> Annotator<B> {
    pub fn new(backend: B, store: LocalStore, config: AnnotatorConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let session = Session::new(generate_session_id(&mut rng, time::now()));

        Self {
            backend,
            store,
            config,
            session,
            font_scale: FontScale::default(),
            rng,
            quit_armed: false,
        }
    }

    /// Load preferences and data, resuming a fresh snapshot when one exists
    ///
    /// On failure the session stays in [`Phase::Loading`] and the returned
    /// notices carry the error.
    pub async fn start(&mut self) -> Vec<Notice> {
        let now_ms = time::now_millis();
        if let Some(scale) = self.store.load_font_scale(now_ms) {
            self.font_scale = scale;
        }

        let snapshot = if self.config.fresh {
            self.store.clear_session();
            None
        } else {
            self.store.load_session(now_ms).filter(|snapshot| {
                if snapshot.has_remaining() {
                    return true;
                }
                tracing::info!(session_id = %snapshot.session_id, "Stored session already finished");
                self.store.clear_session();
                false
            })
        };

        let result = match snapshot {
            Some(snapshot) => match self.backend.fetch_tags().await {
                Ok(vocabulary) => self.session.restore(vocabulary, snapshot),
                Err(e) => return vec![self.session.load_failed(&e)],
            },
            None => match backend::fetch_catalog(&self.backend).await {
                Ok((vocabulary, corpus)) => self.session.load(
                    vocabulary,
                    corpus,
                    self.config.queue_size,
                    &mut self.rng,
                ),
                Err(e) => return vec![self.session.load_failed(&e)],
            },
        };

        result.unwrap_or_else(|e| vec![e.into()])
    }

    pub async fn handle(&mut self, command: Command) -> Reply {
        let quit_armed = std::mem::take(&mut self.quit_armed);

        match command {
            Command::Toggle { facet, tag } => {
                let name = match tag {
                    TagRef::Name(name) => name,
                    TagRef::Position(n) => match n
                        .checked_sub(1)
                        .and_then(|i| self.session.displayed(facet).get(i))
                    {
                        Some(name) => name.clone(),
                        None => {
                            return Reply::notice(Notice::warning(format!(
                                "No tag #{} in {}",
                                n, facet
                            )))
                        }
                    },
                };
                match self.session.toggle_tag(facet, &name) {
                    Ok(_) => Reply::default(),
                    Err(e) => Reply::notice(e.into()),
                }
            }
            Command::Filter { facet, query } => match self.session.set_query(facet, &query) {
                Ok(_) => Reply::default(),
                Err(e) => Reply::notice(e.into()),
            },
            Command::Clear => match self.session.clear_selections() {
                Ok(notice) => Reply::notice(notice),
                Err(e) => Reply::notice(e.into()),
            },
            Command::Skip => match self.session.skip() {
                Ok(notices) => Reply::notices(notices),
                Err(e) => Reply::notice(e.into()),
            },
            Command::Save => self.save().await,
            Command::Export => self.export().await,
            Command::ScaleUp => {
                let changed = self.font_scale.increase();
                self.scale_changed(changed)
            }
            Command::ScaleDown => {
                let changed = self.font_scale.decrease();
                self.scale_changed(changed)
            }
            Command::ScaleReset => {
                self.font_scale.reset();
                self.scale_changed(true)
            }
            Command::Lookup => self.lookup().await,
            Command::Help => Reply::notice(Notice::info(HELP)),
            Command::Quit if !quit_armed && !self.session.selections().is_empty() => {
                self.quit_armed = true;
                Reply::notice(Notice::warning(
                    "You have unsaved annotations. Type q again to quit.",
                ))
            }
            Command::Quit | Command::ForceQuit => Reply {
                quit: true,
                ..Reply::default()
            },
        }
    }

    async fn save(&mut self) -> Reply {
        let payload = match self.session.begin_save() {
            Ok(payload) => payload,
            Err(e) => return Reply::notice(e.into()),
        };

        let outcome = self.backend.save_annotation(&payload).await;
        let result = match outcome {
            Ok(()) => self.session.save_succeeded(time::now()).map(|notices| Reply {
                notices,
                delay_render: Some(self.config.save_delay),
                quit: false,
            }),
            Err(e) => self.session.save_failed(&e).map(Reply::notice),
        };

        result.unwrap_or_else(|e| Reply::notice(e.into()))
    }

    async fn export(&mut self) -> Reply {
        let bundle = match self.session.export(time::now()) {
            Ok(bundle) => bundle,
            Err(e) => return Reply::notice(e.into()),
        };

        match bundle.write_to(&self.config.export_dir).await {
            Ok(path) => Reply::notice(Notice::success(format!(
                "Exported {} annotations to {}",
                bundle.annotations.len(),
                path.display()
            ))),
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                Reply::notice(Notice::error(format!("Export failed: {}", e)))
            }
        }
    }

    async fn lookup(&self) -> Reply {
        let Some(track) = self.session.current_track() else {
            return Reply::notice(Notice::warning("No track selected"));
        };

        match self.backend.fetch_annotation(&track.track_id).await {
            Ok(Some(record)) => {
                let tags: Vec<String> = record
                    .selections
                    .iter()
                    .filter(|(_, tags)| !tags.is_empty())
                    .map(|(facet, tags)| format!("{}: {}", facet, tags.join(", ")))
                    .collect();
                Reply::notice(Notice::info(format!(
                    "Stored {} ({})",
                    record.saved_at.format("%Y-%m-%d %H:%M:%S UTC"),
                    if tags.is_empty() { "no tags".to_string() } else { tags.join("; ") }
                )))
            }
            Ok(None) => Reply::notice(Notice::info("No stored annotation for this track")),
            Err(e) => Reply::notice(Notice::error(format!("Lookup failed: {}", e))),
        }
    }

    fn scale_changed(&mut self, changed: bool) -> Reply {
        if changed {
            self.store.save_font_scale(self.font_scale);
        }
        Reply::notice(Notice::info(format!("Text size {}%", self.font_scale.percent())))
    }

    /// Persist session progress; no-op while loading
    ///
    /// A completed session has nothing left to resume, so its snapshot is
    /// removed instead.
    pub fn save_snapshot(&self) {
        if self.session.phase() == Phase::Completed {
            self.store.clear_session();
            return;
        }
        if let Some(snapshot) = self.session.snapshot(time::now_millis()) {
            self.store.save_session(&snapshot);
        }
    }

    pub fn render(&self) -> String {
        view::render(&self.session.view(), self.font_scale.wrap_width(BASE_WIDTH))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn font_scale(&self) -> FontScale {
        self.font_scale
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
