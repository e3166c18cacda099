//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between heap files and the
//! operators reading them. It holds a bounded number of deserialized pages
//! and evicts the least recently used one when full.
//!
//! # Components
//! - [`BufferPool`] - The main page cache
//! - [`PageCache`] - Generic LRU map the pool is built on
//! - [`BufferPoolStats`] - Performance statistics

mod buffer_pool;
mod lru_cache;
mod stats;

pub use buffer_pool::{BufferPool, PageRef};
pub use lru_cache::PageCache;
pub use stats::{BufferPoolStats, StatsSnapshot};
