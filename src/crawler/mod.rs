//! Bounded concurrent web crawler
//!
//! Breadth-first over links, one fetch task per page. The frontier (every URL
//! ever queued or visited) and its capacity live behind one mutex, and the
//! "not seen yet and still room" check is done together with the insert and
//! the submit of the follow-up task, so concurrent pages can neither overshoot
//! the capacity nor queue the same link twice. Page text goes into the shared
//! index under the index's own lock, outside the frontier lock.
//!
//! The crawl ends when the work queue drains: every admitted URL has been
//! fetched and no task is left holding undiscovered work.

mod fetch;
mod links;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use thiserror::Error;
use url::Url;

use crate::index::ThreadSafeIndex;
use crate::text;
use crate::workqueue::{QueueError, Submitter, WorkQueue};

pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use links::extract_links;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot crawl {0}: only http and https are supported")]
    UnsupportedScheme(Url),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Statistics from one crawl
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CrawlStats {
    pub pages_indexed: usize,
    pub pages_failed: usize,
    pub frontier_size: usize,
    pub duration_secs: f64,
}

/// URLs discovered so far and how many may ever be discovered
#[derive(Debug, Default)]
struct Frontier {
    seen: HashSet<Url>,
    capacity: usize,
}

impl Frontier {
    fn len(&self) -> usize {
        self.seen.len()
    }

    fn is_full(&self) -> bool {
        self.seen.len() >= self.capacity
    }

    /// Capacity never shrinks
    fn raise_capacity(&mut self, limit: usize) {
        self.capacity = self.capacity.max(limit);
    }

    /// True if `url` is new and there is room for it
    fn admits(&self, url: &Url) -> bool {
        !self.is_full() && !self.seen.contains(url)
    }
}

struct CrawlContext<F> {
    fetcher: F,
    index: Arc<ThreadSafeIndex>,
    frontier: Mutex<Frontier>,
    submitter: Submitter,
    pages_indexed: AtomicUsize,
    pages_failed: AtomicUsize,
}

impl<F: Fetcher> CrawlContext<F> {
    // Nothing panics while the frontier is held.
    fn frontier(&self) -> MutexGuard<'_, Frontier> {
        self.frontier.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a fetch for `url` and record it; caller holds the frontier lock
    ///
    /// A URL whose fetch could not be queued is left out of the frontier.
    fn enqueue(self: &Arc<Self>, frontier: &mut Frontier, url: Url) -> Result<bool, QueueError> {
        if !frontier.admits(&url) {
            return Ok(false);
        }
        let context = Arc::clone(self);
        let target = url.clone();
        self.submitter.submit(move || visit(context, target))?;
        frontier.seen.insert(url);
        Ok(true)
    }
}

/// Fetch one page, queue its new links, then index its text
fn visit<F: Fetcher>(context: Arc<CrawlContext<F>>, url: Url) {
    let html = match context.fetcher.fetch_html(&url) {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", url, e);
            context.pages_failed.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    {
        let mut frontier = context.frontier();
        for link in links::extract_links(&url, &html) {
            if frontier.is_full() {
                break;
            }
            match context.enqueue(&mut frontier, link) {
                Ok(true) => tracing::debug!("Frontier size {}", frontier.len()),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Cannot queue links from {}: {}", url, e);
                    break;
                }
            }
        }
    }

    let words = text::html_words(&html);
    context.index.add_all(&words, url.as_str(), 1);
    context.pages_indexed.fetch_add(1, Ordering::Relaxed);
    tracing::debug!("Indexed {} words from {}", words.len(), url);
}

pub struct Crawler<'a, F: Fetcher> {
    queue: &'a WorkQueue,
    context: Arc<CrawlContext<F>>,
}

impl<'a, F: Fetcher> Crawler<'a, F> {
    pub fn new(queue: &'a WorkQueue, index: Arc<ThreadSafeIndex>, fetcher: F) -> Self {
        Self {
            queue,
            context: Arc::new(CrawlContext {
                fetcher,
                index,
                frontier: Mutex::new(Frontier::default()),
                submitter: queue.submitter(),
                pages_indexed: AtomicUsize::new(0),
                pages_failed: AtomicUsize::new(0),
            }),
        }
    }

    /// Crawl from `seed` until the frontier holds `limit` URLs or runs out
    /// of new links, returning once every fetch task has finished
    pub fn crawl(&self, seed: &str, limit: usize) -> Result<CrawlStats, CrawlError> {
        let seed = Url::parse(seed).map_err(|source| CrawlError::InvalidUrl {
            url: seed.to_string(),
            source,
        })?;
        let seed = links::clean(seed);
        if !links::is_web_url(&seed) {
            return Err(CrawlError::UnsupportedScheme(seed));
        }

        let start = Instant::now();
        let indexed_before = self.context.pages_indexed.load(Ordering::Relaxed);
        let failed_before = self.context.pages_failed.load(Ordering::Relaxed);

        let queued = {
            let mut frontier = self.context.frontier();
            frontier.raise_capacity(limit);
            self.context.enqueue(&mut frontier, seed.clone())
        };
        match queued {
            Ok(true) => tracing::info!("Crawling from {} (limit {})", seed, limit),
            Ok(false) => tracing::info!("{} is already in the frontier", seed),
            Err(e) => return Err(e.into()),
        }

        self.queue.await_completion();

        Ok(CrawlStats {
            pages_indexed: self.context.pages_indexed.load(Ordering::Relaxed) - indexed_before,
            pages_failed: self.context.pages_failed.load(Ordering::Relaxed) - failed_before,
            frontier_size: self.context.frontier().len(),
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Every URL discovered so far, sorted
    pub fn discovered(&self) -> Vec<Url> {
        let mut urls: Vec<_> = self.context.frontier().seen.iter().cloned().collect();
        urls.sort();
        urls
    }
}
