// src/synchronized.rs

//! Mutual exclusion around any limiter.

// dependencies
use crate::rate_limiter::RateLimiter;
use parking_lot::Mutex;

/// Forwards every operation to the wrapped limiter while holding one lock.
///
/// The lock covers a single operation, never a sequence of them, so
/// concurrent `try_acquire` calls are linearised: exactly the calls that fit
/// in the remaining allowance succeed. Blocking waits run outside the lock
/// and only take it for each attempt.
#[derive(Debug, Default)]
pub struct Synchronized<L> {
    inner: Mutex<L>,
}

impl<L: RateLimiter> Synchronized<L> {
    pub fn new(limiter: L) -> Self {
        Self {
            inner: Mutex::new(limiter),
        }
    }

    /// Runs `f` against the wrapped limiter under the lock.
    pub fn with_inner<R>(&self, f: impl FnOnce(&L) -> R) -> R {
        let guard = self.inner.lock();
        f(&*guard)
    }

    pub fn into_inner(self) -> L {
        self.inner.into_inner()
    }
}

impl<L: RateLimiter> RateLimiter for Synchronized<L> {
    fn time_until_next_millis(&self) -> u64 {
        self.inner.lock().time_until_next_millis()
    }

    fn is_allowed(&self) -> bool {
        self.inner.lock().is_allowed()
    }

    fn try_acquire(&self) -> bool {
        self.inner.lock().try_acquire()
    }

    fn reset(&self) {
        self.inner.lock().reset()
    }
}
