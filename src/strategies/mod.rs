// src/strategies/mod.rs

//! Concrete limiting policies.
//!
//! Each strategy is an independent type implementing
//! [`RateLimiter`](crate::RateLimiter); they share only the clock helpers in
//! `crate::clock`.

mod composite;
mod fixed_delay;
mod fixed_window;
mod sliding_window;
mod unlimited;

pub use composite::Composite;
pub use fixed_delay::FixedDelay;
pub use fixed_window::FixedWindow;
pub use sliding_window::SlidingWindow;
pub use unlimited::Unlimited;

// dependencies
use crate::clock::saturating_millis;
use crate::errors::RateLimiterError;
use std::time::Duration;

// whole milliseconds of a window, rejecting anything below one millisecond
pub(crate) fn window_millis(window_size: Duration) -> Result<u64, RateLimiterError> {
    match saturating_millis(window_size) {
        0 => Err(RateLimiterError::InvalidWindowSize),
        millis => Ok(millis),
    }
}

pub(crate) fn window_quota(max_quota: u32) -> Result<u32, RateLimiterError> {
    if max_quota <= 1 {
        return Err(RateLimiterError::InvalidQuota(max_quota));
    }
    Ok(max_quota)
}
