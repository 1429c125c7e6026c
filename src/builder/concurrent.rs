//! Parallel document parsing into a shared index
//!
//! Each document becomes one task: parse into a private [`Index`], then merge
//! it into the shared [`ThreadSafeIndex`] with a single write. A failing
//! document only loses its own task.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::{documents, index_document, BuildError, BuildStats};
use crate::index::{Index, ThreadSafeIndex};
use crate::workqueue::WorkQueue;

#[derive(Debug, Default)]
struct Counters {
    files_indexed: AtomicUsize,
    words_indexed: AtomicUsize,
    files_skipped: AtomicUsize,
}

pub struct ConcurrentIndexBuilder<'a> {
    queue: &'a WorkQueue,
    index: Arc<ThreadSafeIndex>,
}

impl<'a> ConcurrentIndexBuilder<'a> {
    pub fn new(queue: &'a WorkQueue, index: Arc<ThreadSafeIndex>) -> Self {
        Self { queue, index }
    }

    /// Index every eligible document under `root`, returning once all
    /// parse tasks have finished
    pub fn build(&self, root: &Path) -> Result<BuildStats, BuildError> {
        let start = Instant::now();
        let counters = Arc::new(Counters::default());

        let paths = documents(root)?;
        tracing::info!(
            "Submitting {} documents to {} workers",
            paths.len(),
            self.queue.size()
        );

        let mut submitted = Ok(());
        for path in paths {
            let index = Arc::clone(&self.index);
            let counters = Arc::clone(&counters);
            if let Err(e) = self.queue.submit(move || parse_task(path, &index, &counters)) {
                submitted = Err(e);
                break;
            }
        }
        // Wait even after a failed submit so no task outlives this call.
        self.queue.await_completion();
        submitted?;

        Ok(BuildStats {
            files_indexed: counters.files_indexed.load(Ordering::Relaxed),
            words_indexed: counters.words_indexed.load(Ordering::Relaxed),
            files_skipped: counters.files_skipped.load(Ordering::Relaxed),
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }
}

fn parse_task(path: PathBuf, shared: &ThreadSafeIndex, counters: &Counters) {
    let mut local = Index::new();
    match index_document(&path, &mut local) {
        Ok(words) => {
            shared.merge(local);
            counters.files_indexed.fetch_add(1, Ordering::Relaxed);
            counters.words_indexed.fetch_add(words, Ordering::Relaxed);
        }
        Err(e) => {
            tracing::warn!("Skipping document: {}", e);
            counters.files_skipped.fetch_add(1, Ordering::Relaxed);
        }
    }
}
