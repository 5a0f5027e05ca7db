// src/strategies/sliding_window.rs

// sliding window: a quota over any trailing window, tracked per grant

// dependencies
use super::{window_millis, window_quota};
use crate::clock::{Clock, SystemClock, millis_until};
use crate::errors::RateLimiterError;
use crate::rate_limiter::RateLimiter;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Allows at most `max_quota` grants in any trailing `window_size`.
///
/// The timestamps of the `max_quota` most recent grants live in a fixed ring.
/// Capacity frees up one grant at a time as each timestamp ages out, unlike
/// [`FixedWindow`](super::FixedWindow) which frees the whole quota at once.
#[derive(Debug)]
pub struct SlidingWindow<C = SystemClock>
where
    C: Clock,
{
    window_millis: u64,
    ring: Box<[AtomicU64]>,
    // next slot to write; once the ring is full this is also the oldest entry
    head: AtomicUsize,
    len: AtomicUsize,
    clock: C,
}

impl SlidingWindow {
    pub fn new(max_quota: u32, window_size: Duration) -> Result<Self, RateLimiterError> {
        Self::with_clock(max_quota, window_size, SystemClock::new())
    }
}

impl<C: Clock> SlidingWindow<C> {
    pub fn with_clock(
        max_quota: u32,
        window_size: Duration,
        clock: C,
    ) -> Result<Self, RateLimiterError> {
        let max_quota = window_quota(max_quota)?;
        let window_millis = window_millis(window_size)?;

        Ok(Self {
            window_millis,
            ring: (0..max_quota).map(|_| AtomicU64::new(0)).collect(),
            head: AtomicUsize::new(0),
            len: AtomicUsize::new(0),
            clock,
        })
    }

    pub fn max_quota(&self) -> u32 {
        self.ring.len() as u32
    }

    pub fn window_size(&self) -> Duration {
        Duration::from_millis(self.window_millis)
    }

    /// Number of tracked grants still inside the trailing window.
    pub fn used_quota(&self) -> u32 {
        let now = self.clock.now_millis();
        let len = self.len.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Relaxed);
        let capacity = self.ring.len();

        (1..=len)
            .map(|back| self.ring[(head + capacity - back) % capacity].load(Ordering::Relaxed))
            .take_while(|&stamp| now.saturating_sub(stamp) < self.window_millis)
            .count() as u32
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // oldest tracked grant, present only once the ring is full
    fn oldest(&self) -> Option<u64> {
        if self.len.load(Ordering::Relaxed) < self.ring.len() {
            return None;
        }
        let head = self.head.load(Ordering::Relaxed);
        Some(self.ring[head].load(Ordering::Relaxed))
    }

    fn is_allowed_at(&self, now: u64) -> bool {
        match self.oldest() {
            None => true,
            Some(oldest) => now.saturating_sub(oldest) >= self.window_millis,
        }
    }

    fn push(&self, now: u64) {
        let head = self.head.load(Ordering::Relaxed);
        self.ring[head].store(now, Ordering::Relaxed);
        self.head
            .store((head + 1) % self.ring.len(), Ordering::Relaxed);

        let len = self.len.load(Ordering::Relaxed);
        if len < self.ring.len() {
            self.len.store(len + 1, Ordering::Relaxed);
        }
    }
}

impl<C: Clock> RateLimiter for SlidingWindow<C> {
    fn time_until_next_millis(&self) -> u64 {
        match self.oldest() {
            None => 0,
            Some(oldest) => {
                millis_until(oldest.saturating_add(self.window_millis), self.clock.now_millis())
            },
        }
    }

    fn is_allowed(&self) -> bool {
        self.is_allowed_at(self.clock.now_millis())
    }

    fn try_acquire(&self) -> bool {
        let now = self.clock.now_millis();
        if !self.is_allowed_at(now) {
            return false;
        }
        self.push(now);
        true
    }

    fn reset(&self) {
        self.head.store(0, Ordering::Relaxed);
        self.len.store(0, Ordering::Relaxed);
    }
}
