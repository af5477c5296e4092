//! Lock strategies guarding the subscriber store.
//!
//! Every manager operation runs inside [`LockPolicy::locked`], and the
//! closure holds the lock for its whole duration. For dispatch that
//! includes every observer invocation.

use std::cell::RefCell;
use std::sync::{Mutex, PoisonError};

/// Exclusive access to a guarded value.
pub trait LockPolicy<T> {
    /// Wrap `value`.
    fn new(value: T) -> Self;

    /// Run `f` with exclusive access to the value.
    fn locked<R>(&self, f: impl FnOnce(&mut T) -> R) -> R;
}

/// Thread-safe lock backed by [`std::sync::Mutex`].
///
/// Not reentrant: acquiring it again on the thread that holds it
/// deadlocks.
#[derive(Debug, Default)]
pub struct MutexLock<T> {
    inner: Mutex<T>,
}

impl<T> LockPolicy<T> for MutexLock<T> {
    fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    fn locked<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        // A panicking observer poisons the mutex mid-dispatch. Dispatch
        // never mutates the store, so the guarded value is still intact.
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

/// No-op lock for managers confined to one thread.
///
/// Backed by a [`RefCell`], so anything holding it is `!Sync` and cannot be
/// shared across threads. Guarding the subscriber list costs no
/// synchronization. Observers are still `Send + Sync` (see
/// [`Observe`](crate::Observe)), so any state they mutate pays for its own
/// atomics or locks.
///
/// # Panics
///
/// Reentrant access, e.g. subscribing from inside an observer during
/// dispatch, panics with an "already borrowed" error.
#[derive(Debug, Default)]
pub struct NullLock<T> {
    inner: RefCell<T>,
}

impl<T> LockPolicy<T> for NullLock<T> {
    fn new(value: T) -> Self {
        Self {
            inner: RefCell::new(value),
        }
    }

    fn locked<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }
}
