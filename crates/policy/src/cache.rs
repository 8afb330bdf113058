//! Injected lookup caches with an explicit time-to-live.
//!
//! Identity and authorized-account lookups are cached so repeated calls
//! within the TTL window return the same answer without reaching the
//! backing store.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default lifetime of a cached lookup: 26 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(26 * 60 * 60);

/// The read/write contract the approvals core needs from a cache.
#[async_trait]
pub trait LookupCache<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Send + Sync,
{
    /// The live value for `key`, if any.
    async fn get(&self, key: &K) -> Option<V>;

    async fn insert(&self, key: K, value: V);

    /// The first live value satisfying `predicate`.
    async fn find(
        &self,
        predicate: &(dyn for<'a> Fn(&'a V) -> bool + Send + Sync),
    ) -> Option<V>;
}

/// An in-process cache whose entries expire `ttl` after insertion.
///
/// Uses tokio's clock, so paused-time tests can advance past the TTL.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[async_trait]
impl<K, V> LookupCache<K, V> for TtlCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let live = entries
            .get(key)
            .map(|(inserted, value)| (inserted.elapsed() < self.ttl, value.clone()));
        match live {
            Some((true, value)) => Some(value),
            Some((false, _)) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn insert(&self, key: K, value: V) {
        self.entries
            .lock()
            .await
            .insert(key, (Instant::now(), value));
    }

    async fn find(
        &self,
        predicate: &(dyn for<'a> Fn(&'a V) -> bool + Send + Sync),
    ) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let ttl = self.ttl;
        entries.retain(|_, (inserted, _)| inserted.elapsed() < ttl);
        entries
            .values()
            .map(|(_, value)| value)
            .find(|value| predicate(*value))
            .cloned()
    }
}
