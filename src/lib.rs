//! Memocache - An in-process expiring key-value cache
//!
//! Provides a thread-safe memoization layer with per-entry TTL, lazy expiry on
//! read and a cancellable background sweeper.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheStats, Clock, MockClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::SweeperState;
