//! Time-bounded in-memory cache for upstream weather payloads.
//!
//! Expiry is lazy: an entry is dropped the first time it is read at or
//! after its deadline. `purge_expired` sweeps the whole map on demand.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::RwLock;
use time::OffsetDateTime;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: OffsetDateTime,
}

pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if now < entry.expires_at => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|e| now >= e.expires_at) {
            entries.remove(key);
            tracing::debug!(key, "cache entry expired");
        }
        None
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        let expires_at = self.clock.now() + self.ttl;
        self.entries
            .write()
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Number of stored entries, expired ones included until they are read
    /// or purged.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| now < e.expires_at);
        before - entries.len()
    }
}
