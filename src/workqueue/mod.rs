//! Fixed-size worker pool with a wave-completion barrier
//!
//! Tasks are boxed closures pulled from a shared FIFO by `N` worker threads.
//! An outstanding-task counter is incremented on submit and decremented once
//! a task has finished (or panicked), and [`WorkQueue::await_completion`]
//! waits for it to reach zero. Tasks may submit further tasks through a
//! [`Submitter`]; the child is counted before the parent finishes, so the
//! counter cannot touch zero while discovered work is still pending.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use thiserror::Error;

/// Pool size used when none is requested
pub const DEFAULT_THREADS: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(n) => n,
    None => unreachable!(),
};

/// A unit of work executed by one worker
pub type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("work queue has been shut down")]
    Closed,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Default)]
struct QueueState {
    tasks: VecDeque<Task>,
    pending: usize,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<QueueState>,
    work_available: Condvar,
    all_done: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn submit(&self, task: Task) -> Result<(), QueueError> {
        let mut state = self.lock();
        if state.shutdown {
            return Err(QueueError::Closed);
        }
        state.pending += 1;
        state.tasks.push_back(task);
        self.work_available.notify_one();
        Ok(())
    }

    fn await_completion(&self) {
        let mut state = self.lock();
        while state.pending > 0 {
            state = self
                .all_done
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn finish_task(&self) {
        let mut state = self.lock();
        state.pending -= 1;
        if state.pending == 0 {
            self.all_done.notify_all();
        }
    }

    /// Next task to run, or `None` once shut down with nothing left queued
    fn next_task(&self) -> Option<Task> {
        let mut state = self.lock();
        loop {
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            if state.shutdown {
                return None;
            }
            state = self
                .work_available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Cloneable handle that can submit work but not wait on or stop the pool
#[derive(Clone)]
pub struct Submitter {
    shared: Arc<Shared>,
}

impl Submitter {
    pub fn submit<F>(&self, task: F) -> Result<(), QueueError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.submit(Box::new(task))
    }
}

/// Pool of worker threads sharing one task queue
pub struct WorkQueue {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkQueue {
    /// Start `threads` workers
    pub fn new(threads: NonZeroUsize) -> Result<Self, QueueError> {
        let mut queue = Self {
            shared: Arc::new(Shared::default()),
            workers: Vec::with_capacity(threads.get()),
        };

        // On a spawn failure `queue` is dropped, which stops the workers
        // already started.
        for id in 0..threads.get() {
            let shared = Arc::clone(&queue.shared);
            let handle = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || worker_loop(id, &shared))?;
            queue.workers.push(handle);
        }

        tracing::debug!("Started work queue with {} workers", threads);
        Ok(queue)
    }

    /// Number of worker threads
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Enqueue a task for asynchronous execution
    pub fn submit<F>(&self, task: F) -> Result<(), QueueError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.submit(Box::new(task))
    }

    /// Handle for tasks that need to enqueue follow-up work
    pub fn submitter(&self) -> Submitter {
        Submitter {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Block until every submitted task, including tasks submitted by other
    /// tasks while waiting, has finished.
    ///
    /// Must not be called from inside a task: the caller would wait on itself.
    pub fn await_completion(&self) {
        self.shared.await_completion();
    }

    /// Stop accepting work and let idle workers exit
    ///
    /// Tasks already queued still run so the outstanding counter drains.
    pub fn shutdown(&self) {
        let mut state = self.shared.lock();
        if !state.shutdown {
            tracing::debug!("Shutting down work queue");
            state.shutdown = true;
        }
        self.shared.work_available.notify_all();
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.shutdown();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("Worker thread terminated abnormally");
            }
        }
    }
}

fn worker_loop(id: usize, shared: &Shared) {
    while let Some(task) = shared.next_task() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("Task panicked on worker {}: {}", id, message);
        }
        shared.finish_task();
    }
    tracing::debug!("Worker {} exiting", id);
}
