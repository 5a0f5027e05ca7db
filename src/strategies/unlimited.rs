// src/strategies/unlimited.rs

// dependencies
use crate::rate_limiter::RateLimiter;

/// Limiter that never limits: the outcome of a configuration with no limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl RateLimiter for Unlimited {
    fn time_until_next_millis(&self) -> u64 {
        0
    }

    fn is_allowed(&self) -> bool {
        true
    }

    fn try_acquire(&self) -> bool {
        true
    }

    fn reset(&self) {}
}
