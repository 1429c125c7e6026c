//! In-memory word-position index
//!
//! Maps each word to the sources (file paths or URLs) it occurs in, and each
//! source to the ascending set of 1-based positions of that word. All three
//! levels are ordered, which keeps serialization stable and lets a prefix
//! search walk one contiguous range of words.
//!
//! Empty inner maps or sets are never stored: a word always has at least one
//! source and a source at least one position.

mod concurrent;
mod result;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Bound;

pub use concurrent::ThreadSafeIndex;
pub use result::SearchResult;

type Postings = BTreeMap<String, BTreeSet<usize>>;

/// How query words are matched against indexed words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The indexed word must equal the query word
    Exact,
    /// The indexed word must start with the query word
    #[default]
    Partial,
}

impl MatchMode {
    pub fn from_exact_flag(exact: bool) -> Self {
        if exact {
            MatchMode::Exact
        } else {
            MatchMode::Partial
        }
    }
}

/// Read-side operations shared by [`Index`] and [`ThreadSafeIndex`]
pub trait WordIndex {
    /// Number of sources containing `word`
    fn count(&self, word: &str) -> usize;

    /// Number of positions of `word` within `source`
    fn count_in(&self, word: &str, source: &str) -> usize;

    fn contains(&self, word: &str) -> bool;

    fn contains_in(&self, word: &str, source: &str) -> bool;

    fn exact_search<S: AsRef<str>>(&self, query: &[S]) -> Vec<SearchResult>;

    fn partial_search<S: AsRef<str>>(&self, query: &[S]) -> Vec<SearchResult>;

    fn search<S: AsRef<str>>(&self, query: &[S], mode: MatchMode) -> Vec<SearchResult> {
        match mode {
            MatchMode::Exact => self.exact_search(query),
            MatchMode::Partial => self.partial_search(query),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index {
    words: BTreeMap<String, Postings>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `word` at `position` in `source`; returns false if it was
    /// already recorded
    pub fn add(&mut self, word: &str, source: &str, position: usize) -> bool {
        self.words
            .entry(word.to_string())
            .or_default()
            .entry(source.to_string())
            .or_default()
            .insert(position)
    }

    /// Record `words` at consecutive positions starting at `start`
    ///
    /// Returns the number of words processed.
    pub fn add_all<S: AsRef<str>>(&mut self, words: &[S], source: &str, start: usize) -> usize {
        for (offset, word) in words.iter().enumerate() {
            self.add(word.as_ref(), source, start + offset);
        }
        words.len()
    }

    /// Union `other` into this index
    pub fn merge(&mut self, other: Index) {
        for (word, postings) in other.words {
            match self.words.get_mut(&word) {
                None => {
                    self.words.insert(word, postings);
                }
                Some(existing) => {
                    for (source, positions) in postings {
                        existing.entry(source).or_default().extend(positions);
                    }
                }
            }
        }
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Indexed words in lexicographic order
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.keys().map(String::as_str)
    }

    /// Positions of `word` in `source`, ascending
    pub fn positions(&self, word: &str, source: &str) -> Option<&BTreeSet<usize>> {
        self.words.get(word)?.get(source)
    }

    /// Fold every source of one matched word into the working result map
    fn collect_matches<'a>(postings: &'a Postings, found: &mut BTreeMap<&'a str, SearchResult>) {
        for (source, positions) in postings {
            let Some(&first) = positions.first() else {
                continue;
            };
            let frequency = positions.len();

            found
                .entry(source.as_str())
                .and_modify(|result| result.update(frequency, first))
                .or_insert_with(|| SearchResult::new(source.as_str(), frequency, first));
        }
    }

    fn ranked(found: BTreeMap<&str, SearchResult>) -> Vec<SearchResult> {
        let mut results: Vec<_> = found.into_values().collect();
        results.sort();
        results
    }
}

impl WordIndex for Index {
    fn count(&self, word: &str) -> usize {
        self.words.get(word).map_or(0, BTreeMap::len)
    }

    fn count_in(&self, word: &str, source: &str) -> usize {
        self.positions(word, source).map_or(0, BTreeSet::len)
    }

    fn contains(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    fn contains_in(&self, word: &str, source: &str) -> bool {
        self.words
            .get(word)
            .is_some_and(|postings| postings.contains_key(source))
    }

    fn exact_search<S: AsRef<str>>(&self, query: &[S]) -> Vec<SearchResult> {
        let mut found = BTreeMap::new();
        for word in query {
            if let Some(postings) = self.words.get(word.as_ref()) {
                Self::collect_matches(postings, &mut found);
            }
        }
        Self::ranked(found)
    }

    fn partial_search<S: AsRef<str>>(&self, query: &[S]) -> Vec<SearchResult> {
        let mut found = BTreeMap::new();
        for prefix in query {
            let prefix = prefix.as_ref();
            // Words sharing a prefix are contiguous and start at the prefix.
            let matches = self
                .words
                .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
                .take_while(|(word, _)| word.starts_with(prefix));
            for (_, postings) in matches {
                Self::collect_matches(postings, &mut found);
            }
        }
        Self::ranked(found)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (word, postings) in &self.words {
            writeln!(f, "{}", word)?;
            for (source, positions) in postings {
                writeln!(f, "  {}: {:?}", source, positions)?;
            }
        }
        Ok(())
    }
}
