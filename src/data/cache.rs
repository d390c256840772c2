//! Memoization table for source responses
//!
//! Entries are keyed by the calling function and its parameters, and expire
//! after a TTL measured on an injectable clock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Time source for cache expiry
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Identity of a memoized call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub function: String,
    pub params: Vec<(String, String)>,
}

impl CacheKey {
    /// Build a key; parameter order does not affect identity
    pub fn new(function: &str, params: &[(&str, String)]) -> Self {
        let mut params: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        params.sort();
        CacheKey {
            function: function.to_string(),
            params,
        }
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// TTL-bounded memoization table
pub struct ResponseCache<V, C: Clock = SystemClock> {
    entries: HashMap<CacheKey, Entry<V>>,
    /// None keeps entries until invalidated
    ttl: Option<Duration>,
    clock: C,
}

impl<V: Clone> ResponseCache<V, SystemClock> {
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self::new(ttl, SystemClock)
    }
}

impl<V: Clone, C: Clock> ResponseCache<V, C> {
    pub fn new(ttl: Option<Duration>, clock: C) -> Self {
        ResponseCache {
            entries: HashMap::new(),
            ttl,
            clock,
        }
    }

    fn is_fresh(&self, entry: &Entry<V>) -> bool {
        match self.ttl {
            Some(ttl) => self.clock.now().saturating_duration_since(entry.stored_at) < ttl,
            None => true,
        }
    }

    /// Cached value for a key, dropping it if it has expired
    pub fn get(&mut self, key: &CacheKey) -> Option<V> {
        let fresh = self.entries.get(key).map(|e| self.is_fresh(e))?;
        if fresh {
            self.entries.get(key).map(|e| e.value.clone())
        } else {
            self.entries.remove(key);
            None
        }
    }

    pub fn insert(&mut self, key: CacheKey, value: V) {
        let stored_at = self.clock.now();
        self.entries.insert(key, Entry { value, stored_at });
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// Errors from `compute` are returned as-is and nothing is stored.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: CacheKey, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            log::debug!("Cache hit: {} {:?}", key.function, key.params);
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn contains(&mut self, key: &CacheKey) -> bool {
        self.get(key).is_some()
    }

    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
