// src/rate_limiter.rs

//! The capability every limiting strategy exposes.

// dependencies
use crate::blocking;
use std::sync::Arc;
use std::time::Duration;

/// Admission-control contract shared by every strategy and wrapper.
///
/// All operations take `&self`. The bare strategies keep their state in
/// atomics, so sharing them is memory-safe, but their check-then-commit
/// sequence is not atomic: wrap them in [`Synchronized`](crate::Synchronized)
/// when several threads acquire concurrently.
pub trait RateLimiter: Send + Sync {
    /// Estimated milliseconds before a grant would currently succeed.
    /// Zero means a grant is allowed right now.
    fn time_until_next_millis(&self) -> u64;

    /// Non-mutating check, equivalent to `time_until_next_millis() == 0`.
    fn is_allowed(&self) -> bool;

    /// Records a grant and returns `true` if currently allowed.
    /// A denial returns `false` and leaves the state untouched.
    fn try_acquire(&self) -> bool;

    /// Clears all history, returning to the just-constructed state.
    fn reset(&self);

    fn time_until_next(&self) -> Duration {
        Duration::from_millis(self.time_until_next_millis())
    }

    /// Sleeps until a grant succeeds.
    fn block_until_allowed(&self) {
        blocking::wait(self)
    }

    /// Sleeps for at most `timeout` waiting for a grant.
    /// Returns `false` if the timeout ran out first; a zero timeout never
    /// attempts a grant.
    fn block_until_allowed_for(&self, timeout: Duration) -> bool {
        blocking::wait_timeout(self, timeout)
    }
}

/// Uniform limiter type returned by the configuration builder.
pub type BoxedRateLimiter = Box<dyn RateLimiter>;

impl<T: RateLimiter + ?Sized> RateLimiter for Box<T> {
    fn time_until_next_millis(&self) -> u64 {
        (**self).time_until_next_millis()
    }

    fn is_allowed(&self) -> bool {
        (**self).is_allowed()
    }

    fn try_acquire(&self) -> bool {
        (**self).try_acquire()
    }

    fn reset(&self) {
        (**self).reset()
    }
}

impl<T: RateLimiter + ?Sized> RateLimiter for Arc<T> {
    fn time_until_next_millis(&self) -> u64 {
        (**self).time_until_next_millis()
    }

    fn is_allowed(&self) -> bool {
        (**self).is_allowed()
    }

    fn try_acquire(&self) -> bool {
        (**self).try_acquire()
    }

    fn reset(&self) {
        (**self).reset()
    }
}
