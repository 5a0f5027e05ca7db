// src/keyed.rs

//! One independent limiter per caller-supplied key.

// dependencies
use crate::clock::{Clock, SystemClock, saturating_millis};
use crate::errors::RateLimiterError;
use crate::rate_limiter::RateLimiter;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

type Factory<L> = dyn Fn() -> Result<L, RateLimiterError> + Send + Sync;

// a stored limiter plus the last time anyone asked for it
struct Slot<L> {
    limiter: Arc<L>,
    last_access_millis: AtomicU64,
}

impl<L> Slot<L> {
    fn new(limiter: Arc<L>, now: u64) -> Self {
        Self {
            limiter,
            last_access_millis: AtomicU64::new(now),
        }
    }

    fn touch(&self, now: u64) -> Arc<L> {
        self.last_access_millis.fetch_max(now, Ordering::Relaxed);
        Arc::clone(&self.limiter)
    }
}

/// Registry that lazily builds one limiter per key through a factory.
///
/// K is the key type; it must be hashable and comparable.
/// C is the clock used to track idle entries, defaulting to SystemClock.
/// Entries are only removed explicitly: by [`remove`](Self::remove),
/// [`reset`](Self::reset) or an idle sweep with
/// [`evict_idle`](Self::evict_idle).
pub struct RateLimiterMap<K, L, C = SystemClock>
where
    K: Hash + Eq,
    C: Clock,
{
    limiters: DashMap<K, Slot<L>>,
    factory: Box<Factory<L>>,
    clock: C,
}

impl<K, L> RateLimiterMap<K, L>
where
    K: Hash + Eq,
    L: RateLimiter,
{
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<L, RateLimiterError> + Send + Sync + 'static,
    {
        Self::with_clock(factory, SystemClock::new())
    }
}

impl<K, L, C> RateLimiterMap<K, L, C>
where
    K: Hash + Eq,
    L: RateLimiter,
    C: Clock,
{
    pub fn with_clock<F>(factory: F, clock: C) -> Self
    where
        F: Fn() -> Result<L, RateLimiterError> + Send + Sync + 'static,
    {
        Self {
            limiters: DashMap::new(),
            factory: Box::new(factory),
            clock,
        }
    }

    /// Returns the limiter for `key`, building it on first access.
    /// A factory error is returned as-is and nothing is stored.
    pub fn get(&self, key: K) -> Result<Arc<L>, RateLimiterError> {
        let now = self.clock.now_millis();
        if let Some(slot) = self.limiters.get(&key) {
            return Ok(slot.touch(now));
        }

        // the entry holds its shard locked; no other map access until it drops
        let limiter = match self.limiters.entry(key) {
            Entry::Occupied(entry) => return Ok(entry.get().touch(now)),
            Entry::Vacant(entry) => {
                let limiter = Arc::new((self.factory)()?);
                entry.insert(Slot::new(Arc::clone(&limiter), now));
                limiter
            }
        };
        debug!(entries = self.limiters.len(), "created keyed limiter");
        Ok(limiter)
    }

    /// Stores `limiter` under `key`, replacing and returning any previous one.
    pub fn insert(&self, key: K, limiter: L) -> Option<Arc<L>> {
        let slot = Slot::new(Arc::new(limiter), self.clock.now_millis());
        self.limiters.insert(key, slot).map(|old| old.limiter)
    }

    pub fn remove(&self, key: &K) -> Option<Arc<L>> {
        self.limiters.remove(key).map(|(_, slot)| slot.limiter)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.limiters.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }

    /// Resets every stored limiter, then forgets all of them.
    pub fn reset(&self) {
        for slot in self.limiters.iter() {
            slot.limiter.reset();
        }
        self.limiters.clear();
    }

    /// Removes entries nobody has asked for during the last `max_idle`.
    /// Returns how many were removed.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = self.clock.now_millis();
        let max_idle_millis = saturating_millis(max_idle);
        let before = self.limiters.len();

        self.limiters.retain(|_, slot| {
            let idle = now.saturating_sub(slot.last_access_millis.load(Ordering::Relaxed));
            idle < max_idle_millis
        });

        let evicted = before.saturating_sub(self.limiters.len());
        if evicted > 0 {
            debug!(evicted, remaining = self.limiters.len(), "evicted idle keyed limiters");
        }
        evicted
    }
}

impl<K, L, C> fmt::Debug for RateLimiterMap<K, L, C>
where
    K: Hash + Eq,
    C: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiterMap")
            .field("entries", &self.limiters.len())
            .finish()
    }
}
