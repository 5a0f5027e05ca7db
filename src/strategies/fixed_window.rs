// src/strategies/fixed_window.rs

// fixed window: a quota per discrete window anchored to its first grant

// dependencies
use super::{window_millis, window_quota};
use crate::clock::{Clock, SystemClock, millis_until};
use crate::errors::RateLimiterError;
use crate::rate_limiter::RateLimiter;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

/// Allows `max_quota` grants per window of `window_size`.
///
/// A window opens with the first grant after a reset or after the previous
/// window expired, not on wall-clock boundaries. The whole quota comes back at
/// once when the window ends.
#[derive(Debug)]
pub struct FixedWindow<C = SystemClock>
where
    C: Clock,
{
    max_quota: u32,
    window_millis: u64,
    used_quota: AtomicU32,
    // 0 means no window is open
    window_end_millis: AtomicU64,
    clock: C,
}

impl FixedWindow {
    pub fn new(max_quota: u32, window_size: Duration) -> Result<Self, RateLimiterError> {
        Self::with_clock(max_quota, window_size, SystemClock::new())
    }
}

impl<C: Clock> FixedWindow<C> {
    pub fn with_clock(
        max_quota: u32,
        window_size: Duration,
        clock: C,
    ) -> Result<Self, RateLimiterError> {
        Ok(Self {
            max_quota: window_quota(max_quota)?,
            window_millis: window_millis(window_size)?,
            used_quota: AtomicU32::new(0),
            window_end_millis: AtomicU64::new(0),
            clock,
        })
    }

    pub fn max_quota(&self) -> u32 {
        self.max_quota
    }

    pub fn window_size(&self) -> Duration {
        Duration::from_millis(self.window_millis)
    }

    /// Grants recorded in the current window. A stale window still reports
    /// its count until the next grant rolls it.
    pub fn used_quota(&self) -> u32 {
        self.used_quota.load(Ordering::Relaxed)
    }

    pub fn window_end_millis(&self) -> u64 {
        self.window_end_millis.load(Ordering::Relaxed)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn has_quota(&self) -> bool {
        self.used_quota() < self.max_quota
    }

    fn is_allowed_at(&self, now: u64) -> bool {
        self.has_quota() || now >= self.window_end_millis()
    }
}

impl<C: Clock> RateLimiter for FixedWindow<C> {
    fn time_until_next_millis(&self) -> u64 {
        if self.has_quota() {
            return 0;
        }
        millis_until(self.window_end_millis(), self.clock.now_millis())
    }

    fn is_allowed(&self) -> bool {
        self.is_allowed_at(self.clock.now_millis())
    }

    fn try_acquire(&self) -> bool {
        let now = self.clock.now_millis();
        if !self.is_allowed_at(now) {
            return false;
        }

        if now >= self.window_end_millis() {
            self.used_quota.store(0, Ordering::Relaxed);
            self.window_end_millis
                .store(now.saturating_add(self.window_millis), Ordering::Relaxed);
        }
        self.used_quota.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn reset(&self) {
        self.used_quota.store(0, Ordering::Relaxed);
        self.window_end_millis.store(0, Ordering::Relaxed);
    }
}
