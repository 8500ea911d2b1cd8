//! # TTL Cache
//! Fixed-TTL snapshot cache keyed by string. Entries are only ever replaced
//! wholesale; an expired entry behaves as absent even though it is still held
//! internally until the next `set` or `invalidate`.
//!
//! Every operation has an `_at(now_ms)` variant so tests can drive a
//! simulated clock instead of the wall clock.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Entry<V> {
    payload: V,
    created_at_ms: u64,
}

/// Thread-safe cache with one TTL shared by all keys. Staleness tolerance is
/// uniform across news keys, so per-entry TTL bookkeeping buys nothing here.
#[derive(Debug)]
pub struct TtlCache<V> {
    inner: Mutex<HashMap<String, Entry<V>>>,
    ttl_ms: u64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl_ms: ttl.as_millis() as u64,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, now_ms())
    }

    /// Returns the payload only while the elapsed time is strictly below the TTL.
    pub fn get_at(&self, key: &str, now_ms: u64) -> Option<V> {
        let map = self.inner.lock().expect("cache mutex poisoned");
        map.get(key)
            .filter(|e| !self.expired(e, now_ms))
            .map(|e| e.payload.clone())
    }

    pub fn set(&self, key: &str, payload: V) {
        self.set_at(key, payload, now_ms());
    }

    /// Replaces any existing entry with a freshly timestamped one.
    pub fn set_at(&self, key: &str, payload: V, now_ms: u64) {
        let mut map = self.inner.lock().expect("cache mutex poisoned");
        map.insert(
            key.to_string(),
            Entry {
                payload,
                created_at_ms: now_ms,
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        let mut map = self.inner.lock().expect("cache mutex poisoned");
        map.remove(key);
    }

    pub fn invalidate_all(&self) {
        let mut map = self.inner.lock().expect("cache mutex poisoned");
        map.clear();
    }

    /// Live payload plus whole seconds until expiry, or `None` when the key
    /// is absent or stale.
    pub fn status(&self, key: &str) -> Option<(V, u64)> {
        self.status_at(key, now_ms())
    }

    pub fn status_at(&self, key: &str, now_ms: u64) -> Option<(V, u64)> {
        let map = self.inner.lock().expect("cache mutex poisoned");
        map.get(key).filter(|e| !self.expired(e, now_ms)).map(|e| {
            let remaining_ms = (e.created_at_ms + self.ttl_ms).saturating_sub(now_ms);
            (e.payload.clone(), remaining_ms / 1000)
        })
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_ms / 1000
    }

    fn expired(&self, e: &Entry<V>, now_ms: u64) -> bool {
        now_ms.saturating_sub(e.created_at_ms) >= self.ttl_ms
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
