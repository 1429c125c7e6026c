//! Ranked search hits
//!
//! Ordering: higher frequency first, then earlier initial position, then
//! path in lexicographic order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Matches for one source, accumulated across the words of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "where")]
    pub path: String,
    #[serde(rename = "count")]
    pub frequency: usize,
    #[serde(rename = "index")]
    pub initial_position: usize,
}

impl SearchResult {
    pub fn new(path: impl Into<String>, frequency: usize, initial_position: usize) -> Self {
        Self {
            path: path.into(),
            frequency,
            initial_position,
        }
    }

    /// Fold another matched word into this result
    pub fn update(&mut self, frequency: usize, position: usize) {
        self.frequency += frequency;
        self.initial_position = self.initial_position.min(position);
    }
}

impl Ord for SearchResult {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .frequency
            .cmp(&self.frequency)
            .then_with(|| self.initial_position.cmp(&other.initial_position))
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
