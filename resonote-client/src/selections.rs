//! Per-facet tag selections for the track on screen

use resonote_common::{Facet, SelectionMap};

/// Selected tags per facet, each kept in the order they were picked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selections {
    sets: [Vec<String>; 4],
}

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the tag if absent, remove it if present. Returns true when the tag
    /// ends up selected.
    pub fn toggle(&mut self, facet: Facet, tag: &str) -> bool {
        let set = &mut self.sets[facet.index()];
        if let Some(pos) = set.iter().position(|t| t == tag) {
            set.remove(pos);
            false
        } else {
            set.push(tag.to_string());
            true
        }
    }

    pub fn is_selected(&self, facet: Facet, tag: &str) -> bool {
        self.sets[facet.index()].iter().any(|t| t == tag)
    }

    pub fn of(&self, facet: Facet) -> &[String] {
        &self.sets[facet.index()]
    }

    /// Number of selected tags across all facets
    pub fn total(&self) -> usize {
        self.sets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn clear(&mut self) {
        for set in &mut self.sets {
            set.clear();
        }
    }

    /// Wire form: every facet key present, empty facets as empty lists
    pub fn to_map(&self) -> SelectionMap {
        Facet::ALL
            .into_iter()
            .map(|facet| (facet.key().to_string(), self.of(facet).to_vec()))
            .collect()
    }
}
