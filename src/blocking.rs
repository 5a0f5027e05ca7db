// src/blocking.rs

//! Waiting for a grant, optionally bounded by a timeout and optionally
//! cancellable from another thread.
//!
//! Every loop here is built on the four [`RateLimiter`] primitives only, so it
//! works the same for bare strategies, composites and synchronized wrappers.
//! Only a successful `try_acquire` mutates limiter state; an aborted wait
//! leaves the limiter exactly as it found it.

// dependencies
use crate::clock::saturating_millis;
use crate::errors::RateLimiterError;
use crate::rate_limiter::RateLimiter;
use parking_lot::{Condvar, Mutex};
use std::convert::Infallible;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::trace;

/// Shared flag used to abort cancellable waits.
///
/// Clones observe the same state. Cancelling wakes every waiter parked on the
/// token straight away rather than at the end of its current sleep.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        *self.inner.cancelled.lock() = true;
        self.inner.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    fn sleep(&self, duration: Duration) -> Result<(), RateLimiterError> {
        // too far out for an Instant: park until cancelled
        let deadline = Instant::now().checked_add(duration);
        let mut cancelled = self.inner.cancelled.lock();
        while !*cancelled {
            match deadline {
                Some(deadline) => {
                    if self.inner.wake.wait_until(&mut cancelled, deadline).timed_out() {
                        break;
                    }
                }
                None => self.inner.wake.wait(&mut cancelled),
            }
        }
        if *cancelled {
            Err(RateLimiterError::Cancelled)
        } else {
            Ok(())
        }
    }
}

// how a wait loop suspends between attempts
trait Pause {
    type Error;

    fn checkpoint(&self) -> Result<(), Self::Error>;
    fn pause(&self, duration: Duration) -> Result<(), Self::Error>;
}

struct ThreadSleep;

impl Pause for ThreadSleep {
    type Error = Infallible;

    fn checkpoint(&self) -> Result<(), Infallible> {
        Ok(())
    }

    fn pause(&self, duration: Duration) -> Result<(), Infallible> {
        if duration.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(duration);
        }
        Ok(())
    }
}

impl Pause for CancellationToken {
    type Error = RateLimiterError;

    fn checkpoint(&self) -> Result<(), RateLimiterError> {
        if self.is_cancelled() {
            Err(RateLimiterError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn pause(&self, duration: Duration) -> Result<(), RateLimiterError> {
        self.sleep(duration)
    }
}

fn wait_with<L, P>(limiter: &L, pause: &P) -> Result<(), P::Error>
where
    L: RateLimiter + ?Sized,
    P: Pause,
{
    loop {
        pause.checkpoint()?;
        if limiter.try_acquire() {
            return Ok(());
        }
        let nap = limiter.time_until_next_millis();
        trace!(sleep_ms = nap, "grant denied, waiting");
        pause.pause(Duration::from_millis(nap))?;
    }
}

fn wait_timeout_with<L, P>(limiter: &L, timeout: Duration, pause: &P) -> Result<bool, P::Error>
where
    L: RateLimiter + ?Sized,
    P: Pause,
{
    if timeout.is_zero() {
        return Ok(false);
    }

    let start = Instant::now();
    loop {
        pause.checkpoint()?;
        if limiter.try_acquire() {
            return Ok(true);
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            trace!(?timeout, "wait timed out");
            return Ok(false);
        }

        let remaining_ms = saturating_millis(timeout - elapsed);
        let nap = limiter.time_until_next_millis().min(remaining_ms);
        if nap == 0 {
            trace!(?timeout, "no time left to wait");
            return Ok(false);
        }
        trace!(sleep_ms = nap, remaining_ms, "grant denied, waiting");
        pause.pause(Duration::from_millis(nap))?;
    }
}

/// Sleeps until `limiter` grants.
pub fn wait<L: RateLimiter + ?Sized>(limiter: &L) {
    match wait_with(limiter, &ThreadSleep) {
        Ok(()) => {}
        Err(never) => match never {},
    }
}

/// Sleeps for at most `timeout` until `limiter` grants.
/// Returns `true` on a grant and `false` when the time ran out.
pub fn wait_timeout<L: RateLimiter + ?Sized>(limiter: &L, timeout: Duration) -> bool {
    match wait_timeout_with(limiter, timeout, &ThreadSleep) {
        Ok(granted) => granted,
        Err(never) => match never {},
    }
}

/// Like [`wait`], but aborts with [`RateLimiterError::Cancelled`] once `token`
/// is cancelled.
pub fn wait_cancellable<L: RateLimiter + ?Sized>(
    limiter: &L,
    token: &CancellationToken,
) -> Result<(), RateLimiterError> {
    wait_with(limiter, token)
}

/// Like [`wait_timeout`], but aborts with [`RateLimiterError::Cancelled`] once
/// `token` is cancelled. Cancellation is never reported as a time-out.
pub fn wait_timeout_cancellable<L: RateLimiter + ?Sized>(
    limiter: &L,
    timeout: Duration,
    token: &CancellationToken,
) -> Result<bool, RateLimiterError> {
    wait_timeout_with(limiter, timeout, token)
}
