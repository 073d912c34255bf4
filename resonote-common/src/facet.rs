//! The four fixed annotation facets
//!
//! Facet keys are the exact JSON keys used by the vocabulary document and by
//! the `selections` map of every annotation payload.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Annotation category a tag belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Facet {
    #[serde(rename = "Emotional_Tone")]
    EmotionalTone,
    #[serde(rename = "Thematic_Content")]
    ThematicContent,
    #[serde(rename = "Narrative_Structure")]
    NarrativeStructure,
    #[serde(rename = "Lyrical_Style")]
    LyricalStyle,
}

impl Facet {
    /// All facets in display order
    pub const ALL: [Facet; 4] = [
        Facet::EmotionalTone,
        Facet::ThematicContent,
        Facet::NarrativeStructure,
        Facet::LyricalStyle,
    ];

    /// JSON key of this facet
    pub fn key(self) -> &'static str {
        match self {
            Facet::EmotionalTone => "Emotional_Tone",
            Facet::ThematicContent => "Thematic_Content",
            Facet::NarrativeStructure => "Narrative_Structure",
            Facet::LyricalStyle => "Lyrical_Style",
        }
    }

    /// Short human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Facet::EmotionalTone => "Tone",
            Facet::ThematicContent => "Theme",
            Facet::NarrativeStructure => "Narrative Structure",
            Facet::LyricalStyle => "Lyrical Style",
        }
    }

    /// Look up a facet by its JSON key
    pub fn from_key(key: &str) -> Option<Facet> {
        Facet::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Position of this facet in [`Facet::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Facet {
    type Err = Error;

    /// Accepts either the JSON key or the label, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Facet::ALL
            .into_iter()
            .find(|f| f.key().eq_ignore_ascii_case(wanted) || f.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown facet: {}", s)))
    }
}
