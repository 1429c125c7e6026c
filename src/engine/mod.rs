//! Run driver
//!
//! Each requested action runs on its own: a failure is reported and the
//! remaining actions still run.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::builder::{BuildStats, ConcurrentIndexBuilder, IndexBuilder};
use crate::cli::Cli;
use crate::crawler::{CrawlStats, Crawler, HttpFetcher};
use crate::index::{Index, MatchMode, ThreadSafeIndex};
use crate::output;
use crate::query::{ConcurrentExecutor, QueryExecutor, QueryResults, SequentialExecutor};
use crate::workqueue::{WorkQueue, DEFAULT_THREADS};

/// Index plus, in multithreaded mode, the pool shared by every stage
enum Engine {
    Sequential(Index),
    Concurrent {
        queue: WorkQueue,
        index: Arc<ThreadSafeIndex>,
    },
}

impl Engine {
    fn build(&mut self, root: &Path) -> Result<BuildStats> {
        tracing::info!("Indexing: {:?}", root);
        let stats = match self {
            Engine::Sequential(index) => IndexBuilder::new(index).build(root)?,
            Engine::Concurrent { queue, index } => {
                ConcurrentIndexBuilder::new(queue, Arc::clone(index)).build(root)?
            }
        };
        Ok(stats)
    }

    fn crawl(&mut self, seed: &str, limit: usize) -> Result<CrawlStats> {
        match self {
            Engine::Concurrent { queue, index } => crawl_into(queue, Arc::clone(index), seed, limit),
            Engine::Sequential(index) => {
                // Crawling is always concurrent; lend the index to a
                // temporary pool and take it back afterwards.
                let queue = WorkQueue::new(DEFAULT_THREADS)?;
                let shared = Arc::new(ThreadSafeIndex::from(std::mem::take(index)));
                let outcome = crawl_into(&queue, Arc::clone(&shared), seed, limit);
                *index = Arc::try_unwrap(shared)
                    .map(ThreadSafeIndex::into_inner)
                    .unwrap_or_else(|shared| shared.snapshot());
                outcome
            }
        }
    }

    fn write_index(&self, path: &Path) -> Result<()> {
        match self {
            Engine::Sequential(index) => output::write_index(index, path)?,
            Engine::Concurrent { index, .. } => {
                index.with_read(|index| output::write_index(index, path))?
            }
        }
        Ok(())
    }

    /// Run a query file, keeping whatever results were gathered even if
    /// reading the file failed part way
    fn query(&self, path: &Path, mode: MatchMode, results: &mut QueryResults) -> Result<()> {
        tracing::info!("Running queries from {:?} ({:?})", path, mode);
        let outcome = match self {
            Engine::Sequential(index) => {
                let mut executor = SequentialExecutor::new(index);
                let outcome = executor.execute_file(path, mode);
                results.extend(executor.into_results());
                outcome
            }
            Engine::Concurrent { queue, index } => {
                let mut executor = ConcurrentExecutor::new(queue, Arc::clone(index));
                let outcome = executor.execute_file(path, mode);
                results.extend(executor.results());
                outcome
            }
        };
        Ok(outcome?)
    }

    fn shutdown(self) {
        if let Engine::Concurrent { queue, .. } = self {
            queue.shutdown();
        }
    }
}

fn crawl_into(
    queue: &WorkQueue,
    index: Arc<ThreadSafeIndex>,
    seed: &str,
    limit: usize,
) -> Result<CrawlStats> {
    let fetcher = HttpFetcher::new().context("Failed to create HTTP client")?;
    let crawler = Crawler::new(queue, index, fetcher);
    Ok(crawler.crawl(seed, limit)?)
}

/// Report a failed action and carry on
fn attempt(action: &str, outcome: Result<()>) {
    if let Err(e) = outcome {
        output::report_failure(action, &e);
    }
}

/// Carry out every action requested on the command line, in the fixed
/// order build, crawl, write index, query, write results
///
/// Only failing to start the worker pool is fatal.
pub fn run(cli: &Cli) -> Result<()> {
    let mut engine = match cli.worker_threads() {
        Some(threads) => Engine::Concurrent {
            queue: WorkQueue::new(threads).context("Failed to start worker threads")?,
            index: Arc::default(),
        },
        None => Engine::Sequential(Index::new()),
    };
    let mut results = QueryResults::new();

    if let Some(root) = &cli.path {
        attempt(
            "Indexing",
            engine.build(root).map(|stats| output::print_build_stats(&stats)),
        );
    }

    if let Some(seed) = &cli.url {
        attempt(
            "Crawling",
            engine
                .crawl(seed, cli.crawl_limit().get())
                .map(|stats| output::print_crawl_stats(&stats)),
        );
    }

    if let Some(path) = &cli.index {
        attempt(
            "Writing index",
            engine
                .write_index(path)
                .map(|()| output::print_written("Index", path)),
        );
    }

    if let Some(path) = &cli.query {
        let mode = MatchMode::from_exact_flag(cli.exact);
        attempt("Querying", engine.query(path, mode, &mut results));
    }

    if let Some(path) = &cli.results {
        attempt(
            "Writing results",
            output::write_results(&results, path)
                .map(|()| output::print_written("Results", path))
                .map_err(Into::into),
        );
    }

    engine.shutdown();
    Ok(())
}
