//! One task per query line against a shared index
//!
//! Searches take the index's read lock; finished result lists go into a
//! result map guarded by a separate lock, so writers to the map never hold
//! up readers of the index.

use std::path::Path;
use std::sync::Arc;

use super::{read_lines, Query, QueryError, QueryExecutor, QueryResults};
use crate::index::{MatchMode, ThreadSafeIndex};
use crate::sync::ReadWriteLock;
use crate::workqueue::WorkQueue;

pub struct ConcurrentExecutor<'a> {
    queue: &'a WorkQueue,
    index: Arc<ThreadSafeIndex>,
    results: Arc<ReadWriteLock<QueryResults>>,
}

impl<'a> ConcurrentExecutor<'a> {
    pub fn new(queue: &'a WorkQueue, index: Arc<ThreadSafeIndex>) -> Self {
        Self {
            queue,
            index,
            results: Arc::default(),
        }
    }

    fn submit_line(&self, line: String, mode: MatchMode) -> Result<(), QueryError> {
        let index = Arc::clone(&self.index);
        let results = Arc::clone(&self.results);
        self.queue.submit(move || {
            let Some(query) = Query::parse(&line) else {
                return;
            };
            let found = query.run(index.as_ref(), mode);
            results.write().insert(query.key, found);
        })?;
        Ok(())
    }
}

impl QueryExecutor for ConcurrentExecutor<'_> {
    fn execute_line(&mut self, line: &str, mode: MatchMode) -> Result<(), QueryError> {
        self.submit_line(line.to_string(), mode)?;
        self.queue.await_completion();
        Ok(())
    }

    fn execute_file(&mut self, path: &Path, mode: MatchMode) -> Result<(), QueryError> {
        let submitted = read_lines(path).and_then(|lines| {
            for line in lines {
                self.submit_line(line?, mode)?;
            }
            Ok(())
        });
        // Lines already submitted must finish before returning, error or not.
        self.queue.await_completion();
        submitted
    }

    fn results(&self) -> QueryResults {
        self.results.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::tests::{pets, QUERIES};
    use crate::query::SequentialExecutor;
    use std::fs;
    use std::num::NonZeroUsize;

    #[test]
    fn test_matches_sequential_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries.txt");
        let many: String = std::iter::repeat(QUERIES).take(20).collect();
        fs::write(&path, many).unwrap();

        let plain = pets();
        let mut sequential = SequentialExecutor::new(&plain);
        sequential.execute_file(&path, MatchMode::Partial).unwrap();

        let queue = WorkQueue::new(NonZeroUsize::new(4).unwrap()).unwrap();
        let shared = Arc::new(ThreadSafeIndex::from(pets()));
        let mut concurrent = ConcurrentExecutor::new(&queue, shared);
        concurrent.execute_file(&path, MatchMode::Partial).unwrap();

        // Readable straight after execute_file returns.
        assert_eq!(concurrent.results(), sequential.results());
    }

    #[test]
    fn test_execute_line_waits_for_its_result() {
        let queue = WorkQueue::new(NonZeroUsize::new(2).unwrap()).unwrap();
        let shared = Arc::new(ThreadSafeIndex::from(pets()));
        let mut executor = ConcurrentExecutor::new(&queue, shared);

        executor.execute_line("CAT", MatchMode::Exact).unwrap();
        executor.execute_line("   ", MatchMode::Exact).unwrap();

        let results = executor.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results["cat"].len(), 1);
    }

    #[test]
    fn test_missing_query_file() {
        let dir = tempfile::tempdir().unwrap();
        let queue = WorkQueue::new(NonZeroUsize::new(2).unwrap()).unwrap();
        let mut executor = ConcurrentExecutor::new(&queue, Arc::new(ThreadSafeIndex::new()));

        let err = executor
            .execute_file(&dir.path().join("absent.txt"), MatchMode::Partial)
            .unwrap_err();
        assert!(matches!(err, QueryError::Read { .. }));
    }
}
