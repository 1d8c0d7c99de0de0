//! Cache Handle Module
//!
//! The caller-owned cache instance: point operations plus the lifecycle of its
//! background sweeper.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::store::Store;
use crate::cache::{CacheStats, Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::{Sweeper, SweeperState};

// == Cache ==
/// Thread-safe key-value cache with per-entry TTL.
///
/// Expired entries are invisible to reads immediately and are physically
/// removed by the background sweeper (when enabled) or by `del`/`flush_all`.
/// Share across threads with `Arc<Cache<V>>`. Dropping the cache stops and
/// joins its sweeper.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use memocache::Cache;
///
/// let cache: Cache<String> = Cache::new(Duration::from_secs(60), Duration::ZERO);
/// cache.set("user:1", "alice".to_string(), Duration::ZERO);
/// assert_eq!(cache.get("user:1"), Some("alice".to_string()));
/// ```
pub struct Cache<V, C = SystemClock> {
    store: Arc<Store<V, C>>,
    sweep_interval: Duration,
    sweeper: Mutex<Sweeper>,
}

impl<V> Cache<V, SystemClock>
where
    V: Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates an empty cache using the system clock.
    ///
    /// # Arguments
    /// * `default_ttl` - Lifetime for entries set with a zero TTL; zero means no expiry
    /// * `sweep_interval` - Background sweep cadence; zero disables the sweeper
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        Self::with_clock(default_ttl, sweep_interval, SystemClock)
    }

    /// Creates an empty cache from a [`CacheConfig`].
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.default_ttl, config.sweep_interval)
    }
}

impl<V, C> Cache<V, C>
where
    V: Send + Sync + 'static,
    C: Clock,
{
    /// Creates an empty cache driven by `clock`.
    ///
    /// The sweeper always ticks on real time; `clock` decides what is expired.
    pub fn with_clock(default_ttl: Duration, sweep_interval: Duration, clock: C) -> Self {
        let store = Arc::new(Store::new(default_ttl, clock));

        let sweeper = if sweep_interval.is_zero() {
            Sweeper::idle()
        } else {
            Sweeper::spawn(store.clone(), sweep_interval)
        };

        debug!(
            "Cache created: default_ttl={:?}, sweep_interval={:?}, sweeper={:?}",
            default_ttl,
            sweep_interval,
            sweeper.state()
        );

        Self {
            store,
            sweep_interval,
            sweeper: Mutex::new(sweeper),
        }
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any existing entry.
    ///
    /// A zero `ttl` uses the default TTL; if that is zero too the entry never
    /// expires.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.store.set(key.into(), value, ttl);
    }

    // == Delete ==
    /// Removes the entry for `key`.
    ///
    /// # Errors
    /// `KeyNotFound` if no entry is stored. Deletion is not idempotent.
    pub fn del(&self, key: &str) -> Result<()> {
        self.store.del(key)
    }

    // == Rename ==
    /// Atomically moves the entry at `old_key` to `new_key`, keeping its value
    /// and expiry and replacing whatever `new_key` held.
    ///
    /// # Errors
    /// - `KeyNotFound` if `old_key` is absent
    /// - `Expired` if `old_key` is logically expired; nothing is modified
    pub fn rename(&self, old_key: &str, new_key: impl Into<String>) -> Result<()> {
        self.store.rename(old_key, new_key.into())
    }

    // == Flush ==
    /// Discards every entry, live or expired.
    pub fn flush_all(&self) {
        let flushed = self.store.flush_all();
        debug!("Cache flushed: {} entries discarded", flushed);
    }

    // == Exist ==
    /// Returns true if `key` has a live entry.
    pub fn exist(&self, key: &str) -> bool {
        self.store.exist(key)
    }

    // == Count ==
    /// Number of stored entries, including expired ones not yet swept.
    pub fn count(&self) -> usize {
        self.store.len()
    }

    // == Is Cache Expired ==
    /// True if the cache holds entries and all of them are expired.
    /// An empty cache is not expired.
    pub fn is_cache_expired(&self) -> bool {
        self.store.is_expired()
    }

    // == TTL ==
    /// Remaining lifetime of the live entry at `key`; `None` if it never expires.
    ///
    /// # Errors
    /// `KeyNotFound` if absent, `Expired` if logically expired.
    pub fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        self.store.ttl(key)
    }

    // == Sweep Expired ==
    /// Runs one sweep cycle on the calling thread and returns how many
    /// entries it removed.
    pub fn sweep_expired(&self) -> usize {
        self.store.sweep_expired()
    }

    // == Stats ==
    /// Snapshot of cache activity counters.
    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    // == Default TTL ==
    /// Lifetime applied to entries set with a zero TTL; zero means no expiry.
    pub fn default_ttl(&self) -> Duration {
        self.store.default_ttl()
    }

    // == Sweep Interval ==
    /// Configured sweeper cadence; zero means the sweeper never started.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    // == Sweeper State ==
    /// Current lifecycle state of the background sweeper.
    ///
    /// `Idle` if sweeping is disabled or the sweeper could not be started.
    pub fn sweeper_state(&self) -> SweeperState {
        self.sweeper.lock().state()
    }

    // == Stop ==
    /// Stops the background sweeper and waits for it to exit.
    ///
    /// Idempotent. The cache remains usable afterwards; expired entries are
    /// then only hidden from reads, not reclaimed.
    pub fn stop(&self) {
        let mut sweeper = self.sweeper.lock();
        if sweeper.state() == SweeperState::Stopped {
            return;
        }
        sweeper.stop();
        info!("Cache stopped");
    }
}

impl<V, C> Cache<V, C>
where
    V: Clone + Send + Sync + 'static,
    C: Clock,
{
    // == Get ==
    /// Returns a clone of the live value at `key`.
    ///
    /// Expired entries read as `None` but are left in place for the sweeper.
    pub fn get(&self, key: &str) -> Option<V> {
        self.store.get(key)
    }
}

impl<V, C> fmt::Debug for Cache<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("sweep_interval", &self.sweep_interval)
            .field("sweeper", &self.sweeper.lock().state())
            .finish_non_exhaustive()
    }
}

impl<V, C> Drop for Cache<V, C> {
    fn drop(&mut self) {
        self.sweeper.get_mut().stop();
    }
}
