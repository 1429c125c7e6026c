//! Writer-preferring multiple-reader/single-writer lock
//!
//! Many readers may hold the lock together as long as no writer holds it or
//! is waiting for it. Once a writer queues up, new readers block until that
//! writer has acquired and released the lock, which bounds writer starvation
//! when queries vastly outnumber index mutations.
//!
//! Acquiring returns a guard; dropping the guard releases the same mode it
//! acquired, so a read acquisition can never be paired with a write release.

use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Admission bookkeeping, guarded by a plain mutex
#[derive(Debug, Default)]
struct LockState {
    readers: usize,
    writer: bool,
    waiting_writers: usize,
}

impl LockState {
    fn admits_reader(&self) -> bool {
        !self.writer && self.waiting_writers == 0
    }

    fn admits_writer(&self) -> bool {
        !self.writer && self.readers == 0
    }
}

/// A lock granting shared read access or exclusive write access to `T`
pub struct ReadWriteLock<T: ?Sized> {
    state: Mutex<LockState>,
    changed: Condvar,
    data: UnsafeCell<T>,
}

// SAFETY: access to `data` is mediated by the admission state; readers only
// ever obtain `&T` while no writer is admitted, and a writer obtains `&mut T`
// only while it is the sole holder.
unsafe impl<T: ?Sized + Send> Send for ReadWriteLock<T> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for ReadWriteLock<T> {}

impl<T> ReadWriteLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            changed: Condvar::new(),
            data: UnsafeCell::new(value),
        }
    }

    /// Consume the lock and return the protected value
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> ReadWriteLock<T> {
    // The state mutex is never held while caller code runs, so a poisoned
    // state is still consistent.
    fn lock_state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, LockState>) -> MutexGuard<'a, LockState> {
        self.changed
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until shared access is granted
    pub fn read(&self) -> ReadGuard<'_, T> {
        let mut state = self.lock_state();
        while !state.admits_reader() {
            state = self.wait(state);
        }
        state.readers += 1;
        ReadGuard { lock: self }
    }

    /// Block until exclusive access is granted
    ///
    /// While this call waits, no new reader is admitted.
    pub fn write(&self) -> WriteGuard<'_, T> {
        let mut state = self.lock_state();
        state.waiting_writers += 1;
        while !state.admits_writer() {
            state = self.wait(state);
        }
        state.waiting_writers -= 1;
        state.writer = true;
        WriteGuard { lock: self }
    }

    /// Shared access if it can be granted without blocking
    pub fn try_read(&self) -> Option<ReadGuard<'_, T>> {
        let mut state = self.lock_state();
        if !state.admits_reader() {
            return None;
        }
        state.readers += 1;
        Some(ReadGuard { lock: self })
    }

    /// Exclusive access if it can be granted without blocking
    pub fn try_write(&self) -> Option<WriteGuard<'_, T>> {
        let mut state = self.lock_state();
        if !state.admits_writer() {
            return None;
        }
        state.writer = true;
        Some(WriteGuard { lock: self })
    }

    /// Mutable access through a unique borrow; no locking needed
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    fn release_read(&self) {
        let mut state = self.lock_state();
        state.readers -= 1;
        if state.readers == 0 {
            self.changed.notify_all();
        }
    }

    fn release_write(&self) {
        let mut state = self.lock_state();
        state.writer = false;
        self.changed.notify_all();
    }

    #[cfg(test)]
    fn waiting_writers(&self) -> usize {
        self.lock_state().waiting_writers
    }
}

impl<T: Default> Default for ReadWriteLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for ReadWriteLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_read() {
            Some(guard) => f
                .debug_struct("ReadWriteLock")
                .field("data", &&*guard)
                .finish(),
            None => f
                .debug_struct("ReadWriteLock")
                .field("data", &format_args!("<locked>"))
                .finish(),
        }
    }
}

/// Shared access; released on drop
pub struct ReadGuard<'a, T: ?Sized> {
    lock: &'a ReadWriteLock<T>,
}

impl<T: ?Sized> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: a reader is admitted, so no writer can hold `&mut T`.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

/// Exclusive access; released on drop
pub struct WriteGuard<'a, T: ?Sized> {
    lock: &'a ReadWriteLock<T>,
}

impl<T: ?Sized> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: this guard is the only holder of the lock.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: this guard is the only holder of the lock.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release_write();
    }
}
