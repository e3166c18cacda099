//! Storage layer - heap files and page formats.
//!
//! This module handles persistent storage:
//! - [`DbFile`] / [`DbFileIterator`] - What the buffer pool and operators see of a table
//! - [`HeapFile`] - Unordered table stored as a flat file of pages
//! - [`page`] - Page types and layouts

mod db_file;
mod heap_file;
pub mod page;

pub use db_file::{DbFile, DbFileIterator};
pub use heap_file::{HeapFile, HeapFileIterator};
