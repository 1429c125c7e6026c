//! Lock-guarded index shared between worker threads
//!
//! Wraps a plain [`Index`] in a [`ReadWriteLock`]. Lookups and searches take
//! the read side, mutations take the write side, so any interleaving of calls
//! behaves like some serial order of the same calls on a plain index.

use std::fmt;

use super::{Index, SearchResult, WordIndex};
use crate::sync::ReadWriteLock;

#[derive(Debug, Default)]
pub struct ThreadSafeIndex {
    inner: ReadWriteLock<Index>,
}

impl ThreadSafeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, word: &str, source: &str, position: usize) -> bool {
        self.inner.write().add(word, source, position)
    }

    pub fn add_all<S: AsRef<str>>(&self, words: &[S], source: &str, start: usize) -> usize {
        self.inner.write().add_all(words, source, start)
    }

    pub fn merge(&self, other: Index) {
        self.inner.write().merge(other);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Run `f` against the index while holding the read lock
    pub fn with_read<R>(&self, f: impl FnOnce(&Index) -> R) -> R {
        f(&self.inner.read())
    }

    /// Independent copy of the current contents
    pub fn snapshot(&self) -> Index {
        self.inner.read().clone()
    }

    pub fn into_inner(self) -> Index {
        self.inner.into_inner()
    }
}

impl From<Index> for ThreadSafeIndex {
    fn from(index: Index) -> Self {
        Self {
            inner: ReadWriteLock::new(index),
        }
    }
}

impl WordIndex for ThreadSafeIndex {
    fn count(&self, word: &str) -> usize {
        self.inner.read().count(word)
    }

    fn count_in(&self, word: &str, source: &str) -> usize {
        self.inner.read().count_in(word, source)
    }

    fn contains(&self, word: &str) -> bool {
        self.inner.read().contains(word)
    }

    fn contains_in(&self, word: &str, source: &str) -> bool {
        self.inner.read().contains_in(word, source)
    }

    fn exact_search<S: AsRef<str>>(&self, query: &[S]) -> Vec<SearchResult> {
        self.inner.read().exact_search(query)
    }

    fn partial_search<S: AsRef<str>>(&self, query: &[S]) -> Vec<SearchResult> {
        self.inner.read().partial_search(query)
    }
}

impl fmt::Display for ThreadSafeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_read(|index| fmt::Display::fmt(index, f))
    }
}
