// src/clock.rs

// clock module definition and implementations

// dependencies
use std::time::{Duration, Instant};

/// Clock trait to abstract time retrieval.
/// Implementors must be thread-safe (Send + Sync).
/// `now_millis` returns the current time in whole milliseconds and must not go
/// backwards while a limiter is using it.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Monotonic real-time clock, measured from the moment it was created.
/// This is the default clock used by every strategy.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }
}

/// Milliseconds from `now` until `target`, zero once `target` has passed.
#[inline]
pub(crate) fn millis_until(target: u64, now: u64) -> u64 {
    target.saturating_sub(now)
}

/// Whole milliseconds in `duration`, capped at `u64::MAX`.
#[inline]
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(any(test, feature = "testing"))]
pub use manual::ManualClock;

#[cfg(any(test, feature = "testing"))]
mod manual {
    use super::Clock;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Controllable clock for deterministic tests.
    /// Clones share the same underlying time.
    #[derive(Debug, Clone, Default)]
    pub struct ManualClock {
        millis: Arc<AtomicU64>,
    }

    impl ManualClock {
        pub fn new(initial_millis: u64) -> Self {
            Self {
                millis: Arc::new(AtomicU64::new(initial_millis)),
            }
        }

        pub fn advance(&self, millis: u64) {
            self.millis.fetch_add(millis, Ordering::Relaxed);
        }

        pub fn set_millis(&self, millis: u64) {
            self.millis.store(millis, Ordering::Relaxed);
        }
    }

    impl Clock for ManualClock {
        fn now_millis(&self) -> u64 {
            self.millis.load(Ordering::Relaxed)
        }
    }
}
