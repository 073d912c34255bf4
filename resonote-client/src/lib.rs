//! # Resonote annotation client
//!
//! Session state machine, fuzzy facet search and the HTTP backend client
//! behind the `resonote-annotate` terminal tool.

pub mod app;
pub mod backend;
pub mod commands;
pub mod export;
pub mod local_store;
pub mod preferences;
pub mod queue;
pub mod search;
pub mod selections;
pub mod session;
pub mod view;

pub use app::{Annotator, AnnotatorConfig, Reply};
pub use backend::{AnnotationBackend, BackendError, HttpBackend};
pub use session::{Notice, NoticeLevel, Phase, Session, SessionError, SessionSnapshot};
