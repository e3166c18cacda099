//! Common types and utilities shared across heapdb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration
//! - Error types
//! - Identifiers (PageId, RecordId, TransactionId)

pub mod config;
pub mod error;
mod page_id;
mod transaction;

pub use config::StorageConfig;
pub use error::{Error, Result};
pub use page_id::{PageId, RecordId};
pub use transaction::{Permissions, TransactionId};
