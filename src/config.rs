// src/config.rs

//! Configuration types for the pace limiter

// dependencies
use crate::clock::{Clock, SystemClock};
use crate::errors::RateLimiterError;
use crate::executor::{Executor, ThrottledExecutor, WorkerPool};
use crate::keyed::RateLimiterMap;
use crate::rate_limiter::BoxedRateLimiter;
use crate::strategies::{Composite, FixedDelay, FixedWindow, SlidingWindow, Unlimited};
use crate::synchronized::Synchronized;
use std::hash::Hash;
use std::time::Duration;
use tracing::debug;

/// How a quota window is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowKind {
    /// Whole quota returns when the window anchored at its first grant ends.
    Fixed,
    /// Each grant frees up individually once it is older than the window.
    #[default]
    Sliding,
}

/// Configuration for rate limiter behavior
///
/// Resolves to exactly one of: no limiting, a fixed delay, a fixed or sliding
/// window, or a composite of a delay and a window.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig<C = SystemClock> {
    pub(crate) delay: Option<Duration>,
    pub(crate) window_size: Option<Duration>,
    pub(crate) max_quota: u32,
    pub(crate) window_kind: WindowKind,
    pub(crate) enforce_thread_safety: bool,
    pub(crate) clock: C,
}

impl RateLimiterConfig {
    /// Create a new configuration with no limits set
    pub fn new() -> Self {
        Self {
            delay: None,
            window_size: None,
            max_quota: 1,
            window_kind: WindowKind::default(),
            enforce_thread_safety: false,
            clock: SystemClock::new(),
        }
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> RateLimiterConfig<C>
where
    C: Clock + Clone + 'static,
{
    /// Builder-style: minimum spacing between grants
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Builder-style: length of the quota window
    pub fn window_size(mut self, window_size: Duration) -> Self {
        self.window_size = Some(window_size);
        self
    }

    /// Builder-style: grants allowed per window
    pub fn max_quota(mut self, max_quota: u32) -> Self {
        self.max_quota = max_quota;
        self
    }

    pub fn window_kind(mut self, window_kind: WindowKind) -> Self {
        self.window_kind = window_kind;
        self
    }

    pub fn fixed_window(self) -> Self {
        self.window_kind(WindowKind::Fixed)
    }

    pub fn sliding_window(self) -> Self {
        self.window_kind(WindowKind::Sliding)
    }

    /// Builder-style: wrap the result in [`Synchronized`]
    pub fn enforce_thread_safety(mut self, enforce: bool) -> Self {
        self.enforce_thread_safety = enforce;
        self
    }

    /// Builder-style: time source for every strategy built from this config
    pub fn clock<C2>(self, clock: C2) -> RateLimiterConfig<C2>
    where
        C2: Clock + Clone + 'static,
    {
        RateLimiterConfig {
            delay: self.delay,
            window_size: self.window_size,
            max_quota: self.max_quota,
            window_kind: self.window_kind,
            enforce_thread_safety: self.enforce_thread_safety,
            clock,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RateLimiterError> {
        if self.delay.is_some_and(|delay| delay.as_millis() == 0) {
            return Err(RateLimiterError::InvalidDelay);
        }
        if self.window_size.is_some_and(|window| window.as_millis() == 0) {
            return Err(RateLimiterError::InvalidWindowSize);
        }
        if self.max_quota == 0 {
            return Err(RateLimiterError::InvalidQuota(0));
        }
        if self.max_quota > 1 && self.window_size.is_none() {
            return Err(RateLimiterError::MissingWindowSize);
        }
        Ok(())
    }

    /// Build the limiter this configuration describes.
    pub fn build(&self) -> Result<BoxedRateLimiter, RateLimiterError> {
        self.validate()?;

        let delay = self.resolve_delay()?;
        let window = self.resolve_window()?;
        let (kind, limiter) = match (delay, window) {
            (Some(delay), Some(window)) => (
                "delay+window",
                Box::new(Composite::pair(delay, window)) as BoxedRateLimiter,
            ),
            (Some(delay), None) => ("delay", Box::new(delay) as BoxedRateLimiter),
            (None, Some(window)) => ("window", window),
            (None, None) => {
                debug!("no limits configured, using unlimited");
                return Ok(Box::new(Unlimited));
            }
        };

        debug!(
            kind,
            delay = ?self.delay,
            window_size = ?self.window_size,
            max_quota = self.max_quota,
            window_kind = ?self.window_kind,
            thread_safe = self.enforce_thread_safety,
            "built rate limiter"
        );

        if self.enforce_thread_safety {
            Ok(Box::new(Synchronized::new(limiter)))
        } else {
            Ok(limiter)
        }
    }

    /// Registry that builds an independent limiter from this configuration
    /// for every new key. Invalid configurations fail here, not on first use.
    pub fn build_map<K>(&self) -> Result<RateLimiterMap<K, BoxedRateLimiter, C>, RateLimiterError>
    where
        K: Hash + Eq,
    {
        self.validate()?;
        let config = self.clone();
        Ok(RateLimiterMap::with_clock(
            move || config.build(),
            self.clock.clone(),
        ))
    }

    /// Throttled executor in front of a fresh single-thread pool.
    pub fn build_executor(
        &self,
    ) -> Result<ThrottledExecutor<WorkerPool, BoxedRateLimiter>, RateLimiterError> {
        ThrottledExecutor::with_executor(WorkerPool::single_thread()?, self.build()?)
    }

    /// Throttled executor in front of `inner`.
    pub fn build_executor_with<E>(
        &self,
        inner: E,
    ) -> Result<ThrottledExecutor<E, BoxedRateLimiter>, RateLimiterError>
    where
        E: Executor + 'static,
    {
        ThrottledExecutor::with_executor(inner, self.build()?)
    }

    // a window with a quota of one is just a delay of the window size
    fn resolve_delay(&self) -> Result<Option<FixedDelay<C>>, RateLimiterError> {
        let delay = match (self.window_size, self.delay) {
            (Some(window), _) if self.max_quota == 1 => window,
            (_, Some(delay)) => delay,
            _ => return Ok(None),
        };
        FixedDelay::with_clock(delay, self.clock.clone()).map(Some)
    }

    fn resolve_window(&self) -> Result<Option<BoxedRateLimiter>, RateLimiterError> {
        let window_size = match self.window_size {
            Some(window_size) if self.max_quota > 1 => window_size,
            _ => return Ok(None),
        };

        let clock = self.clock.clone();
        let window: BoxedRateLimiter = match self.window_kind {
            WindowKind::Fixed => {
                Box::new(FixedWindow::with_clock(self.max_quota, window_size, clock)?)
            }
            WindowKind::Sliding => {
                Box::new(SlidingWindow::with_clock(self.max_quota, window_size, clock)?)
            }
        };
        Ok(Some(window))
    }
}
