//! Directory-to-index builders
//!
//! Both builders walk the tree on the calling thread in file-name order and
//! index every `.html`/`.htm` file under its path as given (root joined with
//! the relative path). The sequential builder parses inline; the concurrent
//! one hands each document to the work queue.

mod concurrent;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use walkdir::WalkDir;

use crate::index::Index;
use crate::text;

pub use concurrent::ConcurrentIndexBuilder;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("path does not exist: {}", .0.display())]
    MissingPath(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Queue(#[from] crate::workqueue::QueueError),
}

/// Statistics from a build
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BuildStats {
    pub files_indexed: usize,
    pub words_indexed: usize,
    pub files_skipped: usize,
    pub duration_secs: f64,
}

/// Single-threaded builder writing straight into an [`Index`]
pub struct IndexBuilder<'a> {
    index: &'a mut Index,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(index: &'a mut Index) -> Self {
        Self { index }
    }

    /// Index every eligible document under `root`
    ///
    /// Unreadable documents are logged and skipped.
    pub fn build(&mut self, root: &Path) -> Result<BuildStats, BuildError> {
        let start = Instant::now();
        let mut stats = BuildStats::default();

        for path in documents(root)? {
            match index_document(&path, self.index) {
                Ok(words) => {
                    stats.files_indexed += 1;
                    stats.words_indexed += words;
                }
                Err(e) => {
                    tracing::warn!("Skipping document: {}", e);
                    stats.files_skipped += 1;
                }
            }
        }

        stats.duration_secs = start.elapsed().as_secs_f64();
        Ok(stats)
    }
}

/// Parse one document into `index`, returning the number of words added
pub fn index_document(path: &Path, index: &mut Index) -> Result<usize, BuildError> {
    let html = fs::read_to_string(path).map_err(|source| BuildError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let words = text::html_words(&html);
    let source = path.to_string_lossy();

    tracing::debug!("Parsed {} words from {}", words.len(), source);
    Ok(index.add_all(&words, &source, 1))
}

/// Eligible documents under `root`, in traversal order
fn documents(root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    if !root.exists() {
        return Err(BuildError::MissingPath(root.to_path_buf()));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() && text::is_html_file(entry.path()) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}
