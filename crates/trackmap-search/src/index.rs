use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use trackmap_core::model::Track;

use crate::tokenize::tokenize;

/// Inverted index from token to track-list positions.
///
/// Tokens keep first-seen order and each postings list keeps first-seen
/// track order, so the serialized index is deterministic for a given track
/// list. Serializes as a flat JSON object: `{"token": [0, 4, 9], ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchIndex {
    postings: IndexMap<String, Vec<usize>>,
}

impl SearchIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the name and artist of every track, keyed by its position.
    #[must_use]
    pub fn build(tracks: &[Track]) -> Self {
        let mut index = Self::new();
        for (position, track) in tracks.iter().enumerate() {
            index.add_text(position, &track.name);
            index.add_text(position, &track.artist);
        }
        log::debug!(
            "Indexed {} tracks into {} tokens",
            tracks.len(),
            index.len()
        );
        index
    }

    /// Record `position` under every token of `text`.
    ///
    /// A position is stored at most once per token. `build` adds positions
    /// in non-decreasing order, so checking the tail of the postings list is
    /// enough to detect a repeat.
    fn add_text(&mut self, position: usize, text: &str) {
        for token in tokenize(text) {
            let postings = self.postings.entry(token).or_default();
            if postings.last() != Some(&position) {
                postings.push(position);
            }
        }
    }

    pub fn lookup(&self, token: &str) -> Option<&[usize]> {
        self.postings.get(token).map(Vec::as_slice)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
