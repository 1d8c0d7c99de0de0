//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a cache.
//!
//! # Tasks
//! - TTL Sweeper: Removes expired cache entries at a configured interval

mod sweeper;

pub(crate) use sweeper::Sweeper;
pub use sweeper::SweeperState;
