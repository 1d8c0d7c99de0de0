//! Cache Store Module
//!
//! Shared entry map guarded by a single reader/writer lock. Both the public
//! [`Cache`](crate::cache::Cache) handle and the background sweeper operate on it.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;

use crate::cache::stats::StatsCollector;
use crate::cache::{CacheEntry, CacheStats, Clock};
use crate::error::{CacheError, Result};

// == Store ==
/// Entry map plus the settings and counters needed to operate on it.
///
/// Readers take the shared lock; every mutation takes the exclusive lock.
/// Time is read after the lock is acquired so an expiry decision and the
/// action taken on it see the same instant.
#[derive(Debug)]
pub(crate) struct Store<V, C> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    default_ttl: Duration,
    clock: C,
    stats: StatsCollector,
}

impl<V, C: Clock> Store<V, C> {
    pub(crate) fn new(default_ttl: Duration, clock: C) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
            clock,
            stats: StatsCollector::default(),
        }
    }

    pub(crate) fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Zero falls back to the default TTL; a zero default means no expiry.
    fn effective_ttl(&self, ttl: Duration) -> Option<Duration> {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        (!ttl.is_zero()).then_some(ttl)
    }

    // == Writes ==

    pub(crate) fn set(&self, key: String, value: V, ttl: Duration) {
        let ttl = self.effective_ttl(ttl);
        let displaced = {
            let mut entries = self.entries.write();
            let entry = CacheEntry::new(value, self.clock.now(), ttl);
            entries.insert(key, entry)
        };
        self.stats.record_set();
        drop(displaced);
    }

    pub(crate) fn del(&self, key: &str) -> Result<()> {
        let removed = self.entries.write().remove(key);
        match removed {
            Some(_) => {
                self.stats.record_delete();
                Ok(())
            }
            None => Err(CacheError::KeyNotFound(key.to_string())),
        }
    }

    /// Moves a live entry to `new_key` under one exclusive lock.
    ///
    /// An expired source is refused and left in place for the sweeper.
    pub(crate) fn rename(&self, old_key: &str, new_key: String) -> Result<()> {
        let displaced = {
            let mut entries = self.entries.write();
            let now = self.clock.now();

            match entries.get(old_key) {
                None => return Err(CacheError::KeyNotFound(old_key.to_string())),
                Some(entry) if entry.is_expired_at(now) => {
                    return Err(CacheError::Expired(old_key.to_string()))
                }
                Some(_) => {}
            }

            if old_key == new_key {
                return Ok(());
            }

            match entries.remove(old_key) {
                Some(entry) => entries.insert(new_key, entry),
                None => None,
            }
        };
        drop(displaced);
        Ok(())
    }

    /// Swaps the map for an empty one; old values drop outside the lock.
    pub(crate) fn flush_all(&self) -> usize {
        let drained = std::mem::take(&mut *self.entries.write());
        drained.len()
    }

    // == Reads ==

    /// Applies `f` to the entry for `key` if it is live.
    fn with_live<R>(&self, key: &str, f: impl FnOnce(&CacheEntry<V>) -> R) -> Option<R> {
        let entries = self.entries.read();
        let now = self.clock.now();
        entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(f)
    }

    pub(crate) fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let value = self.with_live(key, |entry| entry.value.clone());
        self.stats.record_lookup(value.is_some());
        value
    }

    pub(crate) fn exist(&self, key: &str) -> bool {
        self.with_live(key, |_| ()).is_some()
    }

    pub(crate) fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let entries = self.entries.read();
        let now = self.clock.now();
        match entries.get(key) {
            None => Err(CacheError::KeyNotFound(key.to_string())),
            Some(entry) if entry.is_expired_at(now) => Err(CacheError::Expired(key.to_string())),
            Some(entry) => Ok(entry.ttl_remaining_at(now)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True iff at least one entry is stored and all of them are expired.
    pub(crate) fn is_expired(&self) -> bool {
        let entries = self.entries.read();
        let now = self.clock.now();
        !entries.is_empty() && entries.values().all(|entry| entry.is_expired_at(now))
    }

    pub(crate) fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }

    // == Sweeping ==

    /// Phase one: keys expired right now, gathered under the shared lock.
    pub(crate) fn collect_expired(&self) -> Vec<String> {
        let entries = self.entries.read();
        let now = self.clock.now();
        entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Phase two: removes each candidate that is still present and still
    /// expired. Keys renewed since phase one are kept.
    pub(crate) fn remove_if_expired(&self, candidates: &[String]) -> usize {
        let mut removed = Vec::with_capacity(candidates.len());
        {
            let mut entries = self.entries.write();
            let now = self.clock.now();
            for key in candidates {
                let still_expired = entries
                    .get(key)
                    .is_some_and(|entry| entry.is_expired_at(now));
                if still_expired {
                    if let Some(entry) = entries.remove(key) {
                        removed.push(entry);
                    }
                }
            }
        }
        removed.len()
    }

    /// Runs one full sweep cycle and returns the number of removed entries.
    pub(crate) fn sweep_expired(&self) -> usize {
        let candidates = self.collect_expired();
        let removed = if candidates.is_empty() {
            0
        } else {
            self.remove_if_expired(&candidates)
        };
        self.stats.record_sweep(removed);
        removed
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MockClock;

    const MS: Duration = Duration::from_millis(1);

    fn test_store(default_ttl: Duration) -> (Store<String, MockClock>, MockClock) {
        let clock = MockClock::new();
        (Store::new(default_ttl, clock.clone()), clock)
    }

    #[test]
    fn test_store_set_and_get() {
        let (store, _) = test_store(Duration::ZERO);

        store.set("key1".to_string(), "value1".to_string(), Duration::ZERO);

        assert_eq!(store.get("key1"), Some("value1".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let (store, _) = test_store(Duration::ZERO);
        assert_eq!(store.get("nonexistent"), None);
        assert!(!store.exist("nonexistent"));
    }

    #[test]
    fn test_store_overwrite_resets_ttl() {
        let (store, clock) = test_store(Duration::ZERO);

        store.set("key1".to_string(), "value1".to_string(), 10 * MS);
        clock.advance(8 * MS);
        store.set("key1".to_string(), "value2".to_string(), 10 * MS);
        clock.advance(8 * MS);

        assert_eq!(store.get("key1"), Some("value2".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_lazy_expiry_keeps_entry() {
        let (store, clock) = test_store(Duration::ZERO);

        store.set("a".to_string(), "x".to_string(), 10 * MS);
        clock.advance(5 * MS);
        assert_eq!(store.get("a"), Some("x".to_string()));

        clock.advance(10 * MS);
        assert_eq!(store.get("a"), None);
        assert!(!store.exist("a"));
        assert_eq!(store.len(), 1, "expired entry stays until swept");
    }

    #[test]
    fn test_store_default_ttl_applies_to_zero() {
        let (store, clock) = test_store(20 * MS);

        store.set("a".to_string(), "x".to_string(), Duration::ZERO);
        clock.advance(19 * MS);
        assert!(store.exist("a"));

        clock.advance(MS);
        assert!(!store.exist("a"));
    }

    #[test]
    fn test_store_zero_default_never_expires() {
        let (store, clock) = test_store(Duration::ZERO);

        store.set("a".to_string(), "x".to_string(), Duration::ZERO);
        clock.advance(Duration::from_secs(3600));

        assert_eq!(store.get("a"), Some("x".to_string()));
        assert_eq!(store.ttl("a"), Ok(None));
    }

    #[test]
    fn test_store_delete() {
        let (store, _) = test_store(Duration::ZERO);

        store.set("key1".to_string(), "value1".to_string(), Duration::ZERO);
        assert_eq!(store.del("key1"), Ok(()));

        assert_eq!(store.len(), 0);
        assert_eq!(
            store.del("key1"),
            Err(CacheError::KeyNotFound("key1".to_string()))
        );
    }

    #[test]
    fn test_store_delete_expired_entry_succeeds() {
        let (store, clock) = test_store(Duration::ZERO);

        store.set("a".to_string(), "x".to_string(), MS);
        clock.advance(2 * MS);

        assert_eq!(store.del("a"), Ok(()));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_store_rename_moves_entry_and_expiry() {
        let (store, clock) = test_store(Duration::ZERO);

        store.set("a".to_string(), "x".to_string(), 5 * MS);
        clock.advance(MS);
        store.rename("a", "b".to_string()).unwrap();

        assert_eq!(store.get("b"), Some("x".to_string()));
        assert_eq!(store.get("a"), None);
        assert_eq!(store.ttl("b"), Ok(Some(4 * MS)));

        clock.advance(4 * MS);
        assert_eq!(store.get("b"), None, "expiry carried over unchanged");
    }

    #[test]
    fn test_store_rename_overwrites_target() {
        let (store, _) = test_store(Duration::ZERO);

        store.set("a".to_string(), "x".to_string(), Duration::ZERO);
        store.set("b".to_string(), "y".to_string(), Duration::ZERO);
        store.rename("a", "b".to_string()).unwrap();

        assert_eq!(store.get("b"), Some("x".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_rename_missing_source() {
        let (store, _) = test_store(Duration::ZERO);
        store.set("b".to_string(), "y".to_string(), Duration::ZERO);

        assert_eq!(
            store.rename("a", "b".to_string()),
            Err(CacheError::KeyNotFound("a".to_string()))
        );
        assert_eq!(store.get("b"), Some("y".to_string()));
    }

    #[test]
    fn test_store_rename_expired_source_mutates_nothing() {
        let (store, clock) = test_store(Duration::ZERO);

        store.set("a".to_string(), "x".to_string(), 5 * MS);
        clock.advance(10 * MS);

        assert_eq!(
            store.rename("a", "b".to_string()),
            Err(CacheError::Expired("a".to_string()))
        );
        assert_eq!(store.get("a"), None);
        assert!(!store.exist("b"));
        assert_eq!(store.len(), 1, "expired source is left for the sweeper");
    }

    #[test]
    fn test_store_rename_onto_itself() {
        let (store, _) = test_store(Duration::ZERO);
        store.set("a".to_string(), "x".to_string(), Duration::ZERO);

        assert_eq!(store.rename("a", "a".to_string()), Ok(()));
        assert_eq!(store.get("a"), Some("x".to_string()));
    }

    #[test]
    fn test_store_is_expired() {
        let (store, clock) = test_store(Duration::ZERO);
        assert!(!store.is_expired(), "empty store is not expired");

        store.set("a".to_string(), "x".to_string(), 5 * MS);
        store.set("b".to_string(), "y".to_string(), 10 * MS);
        assert!(!store.is_expired());

        clock.advance(6 * MS);
        assert!(!store.is_expired());

        clock.advance(6 * MS);
        assert!(store.is_expired());

        store.set("c".to_string(), "z".to_string(), Duration::ZERO);
        assert!(!store.is_expired(), "a never-expiring entry keeps the store live");
    }

    #[test]
    fn test_store_flush_all() {
        let (store, clock) = test_store(Duration::ZERO);

        store.set("a".to_string(), "x".to_string(), MS);
        store.set("b".to_string(), "y".to_string(), Duration::ZERO);
        clock.advance(2 * MS);

        assert_eq!(store.flush_all(), 2);
        assert_eq!(store.len(), 0);
        assert!(!store.is_expired());
    }

    #[test]
    fn test_store_ttl_errors() {
        let (store, clock) = test_store(Duration::ZERO);

        assert_eq!(
            store.ttl("a"),
            Err(CacheError::KeyNotFound("a".to_string()))
        );

        store.set("a".to_string(), "x".to_string(), 3 * MS);
        clock.advance(3 * MS);
        assert_eq!(store.ttl("a"), Err(CacheError::Expired("a".to_string())));
    }

    #[test]
    fn test_store_sweep_removes_only_expired() {
        let (store, clock) = test_store(Duration::ZERO);

        store.set("key1".to_string(), "value1".to_string(), 10 * MS);
        store.set("key2".to_string(), "value2".to_string(), 100 * MS);
        store.set("key3".to_string(), "value3".to_string(), Duration::ZERO);
        clock.advance(50 * MS);

        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.len(), 2);
        assert!(store.exist("key2"));
        assert!(store.exist("key3"));

        let stats = store.stats();
        assert_eq!(stats.sweeps, 1);
        assert_eq!(stats.swept, 1);
    }

    #[test]
    fn test_store_sweep_keeps_renewed_key() {
        let (store, clock) = test_store(Duration::ZERO);

        store.set("a".to_string(), "old".to_string(), 5 * MS);
        store.set("b".to_string(), "gone".to_string(), 5 * MS);
        clock.advance(10 * MS);

        let candidates = store.collect_expired();
        assert_eq!(candidates.len(), 2);

        // Renewal lands between the scan and the delete phase.
        store.set("a".to_string(), "fresh".to_string(), 50 * MS);

        assert_eq!(store.remove_if_expired(&candidates), 1);
        assert_eq!(store.get("a"), Some("fresh".to_string()));
        assert!(!store.exist("b"));
    }

    #[test]
    fn test_store_sweep_skips_deleted_candidate() {
        let (store, clock) = test_store(Duration::ZERO);

        store.set("a".to_string(), "x".to_string(), MS);
        clock.advance(2 * MS);

        let candidates = store.collect_expired();
        store.del("a").unwrap();

        assert_eq!(store.remove_if_expired(&candidates), 0);
    }

    #[test]
    fn test_store_stats() {
        let (store, _) = test_store(Duration::ZERO);

        store.set("key1".to_string(), "value1".to_string(), Duration::ZERO);
        store.get("key1"); // hit
        store.get("nonexistent"); // miss
        store.del("key1").unwrap();

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.deletes, 1);
        assert_eq!(stats.total_entries, 0);
    }
}
