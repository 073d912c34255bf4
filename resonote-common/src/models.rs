//! Track, vocabulary and annotation models
//!
//! These are the JSON documents exchanged between client and server and the
//! files the server keeps on disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::Facet;

/// Per-facet selected tags as they travel on the wire and sit on disk
///
/// Keys are facet keys (see [`Facet::key`]); the server does not check them.
pub type SelectionMap = BTreeMap<String, Vec<String>>;

// ========================================
// Corpus
// ========================================

/// A song entry from the track corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier; empty when the corpus entry has none
    #[serde(default, deserialize_with = "deserialize_required_text")]
    pub track_id: String,

    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub track_name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,

    /// Lyrics text; empty when the corpus entry has none
    #[serde(default, deserialize_with = "deserialize_required_text")]
    pub lyrics: String,
}

impl Track {
    /// Only tracks with an id and lyrics can be annotated
    pub fn is_eligible(&self) -> bool {
        !self.track_id.is_empty() && !self.lyrics.is_empty()
    }

    /// Title for display, falling back to "Unknown Track"
    pub fn display_title(&self) -> &str {
        self.track_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown Track")
    }

    /// "artist • id" subtitle, skipping empty parts
    pub fn display_subtitle(&self) -> String {
        [self.artist_name.as_deref().unwrap_or(""), self.track_id.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" • ")
    }

    /// Parse a corpus document entry by entry
    ///
    /// Entries that are not objects are skipped with a warning instead of
    /// failing the whole corpus.
    pub fn parse_corpus(document: serde_json::Value) -> crate::Result<Vec<Track>> {
        let serde_json::Value::Array(entries) = document else {
            return Err(crate::Error::InvalidInput(
                "track corpus is not a JSON array".to_string(),
            ));
        };

        let mut tracks = Vec::with_capacity(entries.len());
        for (position, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<Track>(entry) {
                Ok(track) => tracks.push(track),
                Err(e) => tracing::warn!(position, error = %e, "Skipping unreadable corpus entry"),
            }
        }
        Ok(tracks)
    }
}

/// Strings pass through; numbers and booleans are rendered as text
fn scalar_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Ids and lyrics: numeric ids appear in some exports, other values read as empty
fn deserialize_required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(scalar_text(value).unwrap_or_default())
}

/// Display fields: anything that is not a scalar reads as absent
fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(scalar_text(value))
}

// ========================================
// Vocabulary
// ========================================

/// Tag vocabulary: ordered, distinct tags per facet
///
/// Keys of the source document that are not facet keys are dropped whatever
/// their value. A facet missing from the document has an empty tag list, and
/// non-string entries in a facet list are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, serde_json::Value>",
    into = "BTreeMap<String, Vec<String>>"
)]
pub struct TagVocabulary {
    facets: BTreeMap<Facet, Vec<String>>,
}

impl TagVocabulary {
    /// Build from per-facet tag lists, keeping the first occurrence of duplicates
    pub fn new<I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Facet, Vec<T>)>,
        T: Into<String>,
    {
        let mut facets = BTreeMap::new();
        for (facet, tags) in entries {
            let mut distinct: Vec<String> = Vec::with_capacity(tags.len());
            for tag in tags {
                let tag = tag.into();
                if !distinct.contains(&tag) {
                    distinct.push(tag);
                }
            }
            facets.insert(facet, distinct);
        }
        Self { facets }
    }

    /// Tags of a facet, in vocabulary order
    pub fn tags(&self, facet: Facet) -> &[String] {
        self.facets.get(&facet).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, facet: Facet, tag: &str) -> bool {
        self.tags(facet).iter().any(|t| t == tag)
    }

    /// Total number of tags across all facets
    pub fn len(&self) -> usize {
        self.facets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<BTreeMap<String, serde_json::Value>> for TagVocabulary {
    fn from(raw: BTreeMap<String, serde_json::Value>) -> Self {
        TagVocabulary::new(raw.into_iter().filter_map(|(key, value)| {
            let facet = Facet::from_key(&key)?;
            let tags: Vec<String> = match value {
                serde_json::Value::Array(items) => items
                    .into_iter()
                    .filter_map(|item| match item {
                        serde_json::Value::String(tag) => Some(tag),
                        _ => None,
                    })
                    .collect(),
                other => {
                    tracing::warn!(facet = %key, kind = %json_kind(&other), "Facet tags are not a list");
                    Vec::new()
                }
            };
            Some((facet, tags))
        }))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl From<TagVocabulary> for BTreeMap<String, Vec<String>> {
    fn from(vocabulary: TagVocabulary) -> Self {
        vocabulary
            .facets
            .into_iter()
            .map(|(facet, tags)| (facet.key().to_string(), tags))
            .collect()
    }
}

// ========================================
// Annotations
// ========================================

/// Body of `POST /api/annotate` as sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationPayload {
    pub track_id: String,
    pub selections: SelectionMap,
}

/// Response of a successful `POST /api/annotate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveAnnotationResponse {
    pub ok: bool,
}

/// One stored annotation, one file per track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub track_id: String,
    pub selections: SelectionMap,
    pub saved_at: DateTime<Utc>,
}

/// Index entry pointing at a stored record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Record location relative to the data root
    pub path: String,
    pub saved_at: DateTime<Utc>,
}

/// Summary of all stored annotations
///
/// `total` is derived from `by_track` and recomputed on every upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationIndex {
    #[serde(default)]
    pub by_track: BTreeMap<String, IndexEntry>,
    #[serde(default)]
    pub total: usize,
}

impl AnnotationIndex {
    /// Insert or replace the entry for a track and refresh `total`
    pub fn upsert(&mut self, track_id: impl Into<String>, entry: IndexEntry) {
        self.by_track.insert(track_id.into(), entry);
        self.total = self.by_track.len();
    }

    pub fn get(&self, track_id: &str) -> Option<&IndexEntry> {
        self.by_track.get(track_id)
    }
}
