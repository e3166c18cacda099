//! Configuration for heapdb.
//!
//! Nothing here is persisted. The embedding system builds a [`StorageConfig`]
//! at startup and hands it to the [`BufferPool`](crate::buffer::BufferPool).

use crate::common::{Error, Result};

/// Default size of a page in bytes (4KB).
///
/// Matches the OS page size on most systems. Tests routinely shrink it to
/// get a handful of slots per page.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default number of pages the buffer pool keeps resident.
pub const DEFAULT_POOL_PAGES: usize = 50;

/// Fixed number of payload bytes in a serialized string field.
pub const STRING_LEN: usize = 128;

/// Runtime settings shared by the buffer pool and every heap file it serves.
///
/// # Example
/// ```
/// use heapdb::common::config::StorageConfig;
///
/// let config = StorageConfig::default().with_pool_capacity(8);
/// assert_eq!(config.pool_capacity, 8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    /// Size of every page, on disk and in memory.
    pub page_size: usize,

    /// Maximum number of resident pages.
    pub pool_capacity: usize,
}

impl StorageConfig {
    pub fn new(page_size: usize, pool_capacity: usize) -> Self {
        Self {
            page_size,
            pool_capacity,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = pool_capacity;
        self
    }

    /// Reject settings the pool cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::InvalidConfig("page_size must be > 0"));
        }
        if self.pool_capacity == 0 {
            return Err(Error::InvalidConfig("pool_capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DEFAULT_POOL_PAGES)
    }
}
