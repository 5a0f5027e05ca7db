// src/lib.rs

//! # Pace Limiter
//!
//! Local, single-process admission control. A limiter decides from elapsed
//! time and its policy whether an operation may proceed now, and if not, how
//! long until it may.
//!
//! Strategies: [`FixedDelay`], [`FixedWindow`], [`SlidingWindow`], their AND
//! combination [`Composite`], and [`Unlimited`]. [`Synchronized`] adds mutual
//! exclusion for concurrent callers, [`RateLimiterMap`] keeps one limiter per
//! key, and [`ThrottledExecutor`] gates task submission through a limiter.
//!
//! ## Quick Example
//!
//! ```rust
//! use pace_limiter::{RateLimiter, RateLimiterConfig};
//! use std::time::Duration;
//!
//! let limiter = RateLimiterConfig::new()
//!     .window_size(Duration::from_secs(1))
//!     .max_quota(5)
//!     .build()
//!     .unwrap();
//!
//! if limiter.try_acquire() {
//!     println!("Request allowed");
//! } else {
//!     println!("Rate limited - retry after {}ms", limiter.time_until_next_millis());
//! }
//! ```

// private modules
mod blocking;
mod clock;
mod config;
mod errors;
mod executor;
mod keyed;
mod rate_limiter;
mod strategies;
mod synchronized;

// public API exports
pub use blocking::{
    CancellationToken, wait, wait_cancellable, wait_timeout, wait_timeout_cancellable,
};
#[cfg(feature = "testing")]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use config::{RateLimiterConfig, WindowKind};
pub use errors::RateLimiterError;
pub use executor::{Executor, Task, ThrottledExecutor, WorkerPool};
pub use keyed::RateLimiterMap;
pub use rate_limiter::{BoxedRateLimiter, RateLimiter};
pub use strategies::{Composite, FixedDelay, FixedWindow, SlidingWindow, Unlimited};
pub use synchronized::Synchronized;
