//! Query file execution
//!
//! Each line of a query file is parsed into words, sorted, and keyed by those
//! words joined with single spaces. Repeated words are kept, so each copy
//! counts towards the frequencies again. Lines that only differ in word order
//! share a key, and a later line with the same key replaces the earlier
//! results. Lines without words are skipped.

mod concurrent;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::index::{MatchMode, SearchResult, WordIndex};
use crate::text;

pub use concurrent::ConcurrentExecutor;

/// Ranked results per canonical query, in key order
pub type QueryResults = BTreeMap<String, Vec<SearchResult>>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to read queries from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Queue(#[from] crate::workqueue::QueueError),
}

/// One parsed query line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub key: String,
    pub words: Vec<String>,
}

impl Query {
    /// `None` when the line has no words
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = text::parse_words(line);
        if words.is_empty() {
            return None;
        }
        words.sort_unstable();
        Some(Self {
            key: words.join(" "),
            words,
        })
    }

    pub fn run<I: WordIndex + ?Sized>(&self, index: &I, mode: MatchMode) -> Vec<SearchResult> {
        index.search(&self.words, mode)
    }
}

/// Runs query files against an index and keeps the results
pub trait QueryExecutor {
    /// Process one query line
    fn execute_line(&mut self, line: &str, mode: MatchMode) -> Result<(), QueryError>;

    /// Process every line of `path`; results are complete on return
    fn execute_file(&mut self, path: &Path, mode: MatchMode) -> Result<(), QueryError>;

    /// Copy of the results gathered so far
    fn results(&self) -> QueryResults;
}

/// Lines of a query file, with read errors tagged by path
fn read_lines(path: &Path) -> Result<impl Iterator<Item = Result<String, QueryError>>, QueryError> {
    let read_error = |source| QueryError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(read_error)?;
    let path = path.to_path_buf();
    Ok(BufReader::new(file).lines().map(move |line| {
        line.map_err(|source| QueryError::Read {
            path: path.clone(),
            source,
        })
    }))
}

/// Resolves each line inline on the calling thread
pub struct SequentialExecutor<'a, I: WordIndex> {
    index: &'a I,
    results: QueryResults,
}

impl<'a, I: WordIndex> SequentialExecutor<'a, I> {
    pub fn new(index: &'a I) -> Self {
        Self {
            index,
            results: QueryResults::new(),
        }
    }

    pub fn into_results(self) -> QueryResults {
        self.results
    }
}

impl<I: WordIndex> QueryExecutor for SequentialExecutor<'_, I> {
    fn execute_line(&mut self, line: &str, mode: MatchMode) -> Result<(), QueryError> {
        if let Some(query) = Query::parse(line) {
            let found = query.run(self.index, mode);
            self.results.insert(query.key, found);
        }
        Ok(())
    }

    fn execute_file(&mut self, path: &Path, mode: MatchMode) -> Result<(), QueryError> {
        for line in read_lines(path)? {
            self.execute_line(&line?, mode)?;
        }
        Ok(())
    }

    fn results(&self) -> QueryResults {
        self.results.clone()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::index::Index;
    use std::fs;

    /// a.html: "cat dog cat", b.html: "dog dog"
    pub(crate) fn pets() -> Index {
        let mut index = Index::new();
        index.add_all(&["cat", "dog", "cat"], "a.html", 1);
        index.add_all(&["dog", "dog"], "b.html", 1);
        index
    }

    pub(crate) const QUERIES: &str = "Dog\n\n  ...  \ncat dog\ndog CAT dog\nd\nzebra\n";

    #[test]
    fn test_parse_builds_canonical_key() {
        let query = Query::parse("Dog, cat! dog").unwrap();
        assert_eq!(query.key, "cat dog dog");
        assert_eq!(query.words, ["cat", "dog", "dog"]);
        assert_eq!(Query::parse("dog  CAT").unwrap().key, "cat dog");
        assert!(Query::parse("  123 !! ").is_none());
        assert!(Query::parse("").is_none());
    }

    #[test]
    fn test_executes_query_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries.txt");
        fs::write(&path, QUERIES).unwrap();

        let index = pets();
        let mut executor = SequentialExecutor::new(&index);
        executor.execute_file(&path, MatchMode::Partial).unwrap();
        let results = executor.into_results();

        assert_eq!(
            results.keys().collect::<Vec<_>>(),
            ["cat dog", "cat dog dog", "d", "dog", "zebra"]
        );
        assert_eq!(
            results["dog"],
            vec![
                SearchResult::new("b.html", 2, 1),
                SearchResult::new("a.html", 1, 2),
            ]
        );
        assert_eq!(results["d"], results["dog"]);
        assert_eq!(
            results["cat dog"],
            vec![
                SearchResult::new("a.html", 3, 1),
                SearchResult::new("b.html", 2, 1),
            ]
        );
        assert_eq!(
            results["cat dog dog"],
            vec![
                SearchResult::new("a.html", 4, 1),
                SearchResult::new("b.html", 4, 1),
            ]
        );
        assert!(results["zebra"].is_empty());
    }

    #[test]
    fn test_repeated_words_count_again() {
        let index = pets();
        let query = Query::parse("dog dog").unwrap();
        assert_eq!(query.key, "dog dog");
        assert_eq!(
            query.run(&index, MatchMode::Exact),
            vec![
                SearchResult::new("b.html", 4, 1),
                SearchResult::new("a.html", 2, 2),
            ]
        );

        let mut executor = SequentialExecutor::new(&index);
        executor.execute_line("dog", MatchMode::Exact).unwrap();
        executor.execute_line("dog DOG", MatchMode::Exact).unwrap();
        let results = executor.into_results();
        assert_eq!(results["dog"][0].frequency, 2);
        assert_eq!(results["dog dog"][0].frequency, 4);
    }

    #[test]
    fn test_exact_mode_ignores_prefixes() {
        let index = pets();
        let mut executor = SequentialExecutor::new(&index);
        executor.execute_line("d", MatchMode::Exact).unwrap();
        executor.execute_line("do", MatchMode::Partial).unwrap();

        let results = executor.results();
        assert!(results["d"].is_empty());
        assert_eq!(results["do"].len(), 2);
    }

    #[test]
    fn test_missing_query_file() {
        let dir = tempfile::tempdir().unwrap();
        let index = pets();
        let mut executor = SequentialExecutor::new(&index);

        let err = executor
            .execute_file(&dir.path().join("absent.txt"), MatchMode::Exact)
            .unwrap_err();
        assert!(matches!(err, QueryError::Read { .. }));
        assert!(executor.results().is_empty());
    }
}
