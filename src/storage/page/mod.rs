//! Page types and layout.
//!
//! This module contains:
//! - [`HeapPage`] - bitmap header plus fixed-width tuple slots

mod heap_page;

pub use heap_page::HeapPage;
