// src/strategies/composite.rs

// AND-composition of two or more limiters

// dependencies
use crate::errors::RateLimiterError;
use crate::rate_limiter::{BoxedRateLimiter, RateLimiter};
use parking_lot::Mutex;
use std::fmt;
use tracing::warn;

/// Grants only when every child grants, and then records the grant in all of
/// them.
///
/// The check and the commit run under one composite-level guard, so two
/// callers of the same composite cannot interleave between them. Children
/// are owned by the composite; a child that is also reachable elsewhere (an
/// `Arc` handed to another caller) can still change between the check and the
/// commit, which is logged as a partial commit.
pub struct Composite {
    children: Vec<BoxedRateLimiter>,
    commit: Mutex<()>,
}

impl Composite {
    pub fn new(children: Vec<BoxedRateLimiter>) -> Result<Self, RateLimiterError> {
        if children.len() < 2 {
            return Err(RateLimiterError::InvalidComposite(children.len()));
        }
        Ok(Self {
            children,
            commit: Mutex::new(()),
        })
    }

    /// Composite of exactly two limiters, the shape the builder produces for
    /// a delay combined with a window.
    pub fn pair<A, B>(first: A, second: B) -> Self
    where
        A: RateLimiter + 'static,
        B: RateLimiter + 'static,
    {
        Self {
            children: vec![Box::new(first), Box::new(second)],
            commit: Mutex::new(()),
        }
    }

    pub fn children(&self) -> &[BoxedRateLimiter] {
        &self.children
    }
}

impl fmt::Debug for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("children", &self.children.len())
            .field("time_until_next_millis", &self.time_until_next_millis())
            .finish()
    }
}

impl RateLimiter for Composite {
    fn time_until_next_millis(&self) -> u64 {
        self.children
            .iter()
            .map(|child| child.time_until_next_millis())
            .max()
            .unwrap_or(0)
    }

    fn is_allowed(&self) -> bool {
        self.children.iter().all(|child| child.is_allowed())
    }

    fn try_acquire(&self) -> bool {
        let _guard = self.commit.lock();
        if !self.is_allowed() {
            return false;
        }

        for (index, child) in self.children.iter().enumerate() {
            if !child.try_acquire() {
                warn!(
                    child = index,
                    "composite commit denied after a successful check; earlier children keep their grant"
                );
                return false;
            }
        }
        true
    }

    fn reset(&self) {
        let _guard = self.commit.lock();
        for child in &self.children {
            child.reset();
        }
    }
}
