//! Cache Module
//!
//! Provides the in-memory expiring cache, its entries, clock and statistics.

mod clock;
mod entry;
mod handle;
mod stats;
pub(crate) mod store;


// Re-export public types
pub use clock::{Clock, MockClock, SystemClock};
pub(crate) use entry::CacheEntry;
pub use handle::Cache;
pub use stats::CacheStats;
