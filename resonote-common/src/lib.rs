//! # Resonote Common Library
//!
//! Shared code for the Resonote annotation server and client:
//! - Facet definitions
//! - Track, vocabulary and annotation models (the JSON wire/disk formats)
//! - Configuration loading and data root resolution
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod facet;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use facet::Facet;
pub use models::{
    AnnotationIndex, AnnotationPayload, AnnotationRecord, IndexEntry, SaveAnnotationResponse,
    SelectionMap, TagVocabulary, Track,
};
