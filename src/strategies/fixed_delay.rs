// src/strategies/fixed_delay.rs

// fixed delay: a minimum spacing between any two grants

// dependencies
use crate::clock::{Clock, SystemClock, millis_until, saturating_millis};
use crate::errors::RateLimiterError;
use crate::rate_limiter::RateLimiter;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Allows one grant, then nothing until `delay` has passed since that grant.
///
/// The first request is always allowed: the next-allowed time starts at 0.
#[derive(Debug)]
pub struct FixedDelay<C = SystemClock>
where
    C: Clock,
{
    delay_millis: u64,
    next_allowed_millis: AtomicU64,
    clock: C,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Result<Self, RateLimiterError> {
        Self::with_clock(delay, SystemClock::new())
    }
}

impl<C: Clock> FixedDelay<C> {
    pub fn with_clock(delay: Duration, clock: C) -> Result<Self, RateLimiterError> {
        let delay_millis = match saturating_millis(delay) {
            0 => return Err(RateLimiterError::InvalidDelay),
            millis => millis,
        };

        Ok(Self {
            delay_millis,
            next_allowed_millis: AtomicU64::new(0),
            clock,
        })
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_millis)
    }

    /// Clock reading at which the next grant becomes possible; 0 before the
    /// first grant.
    pub fn next_allowed_millis(&self) -> u64 {
        self.next_allowed_millis.load(Ordering::Relaxed)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock> RateLimiter for FixedDelay<C> {
    fn time_until_next_millis(&self) -> u64 {
        millis_until(self.next_allowed_millis(), self.clock.now_millis())
    }

    fn is_allowed(&self) -> bool {
        self.clock.now_millis() >= self.next_allowed_millis()
    }

    fn try_acquire(&self) -> bool {
        let now = self.clock.now_millis();
        if now < self.next_allowed_millis() {
            return false;
        }
        self.next_allowed_millis
            .store(now.saturating_add(self.delay_millis), Ordering::Relaxed);
        true
    }

    fn reset(&self) {
        self.next_allowed_millis.store(0, Ordering::Relaxed);
    }
}
