//! heapdb - heap-file storage with an LRU buffer pool.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Operators / query layer (caller)                │
//! └─────────────────────────────────────────────────────────────────┘
//!                 │ get_page / insert_tuple / iterator
//!                 ↓
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Buffer Pool (buffer/)                                          │
//! │      BufferPool + PageCache (LRU) + Statistics                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                 │ read_page / write_page
//!                 ↓
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Storage Layer (storage/)                                       │
//! │      DbFile trait + HeapFile + HeapPage                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, RecordId, TransactionId, Error, config)
//! - [`tuple`] - Field types, schemas and tuples
//! - [`buffer`] - Buffer pool and its LRU cache
//! - [`storage`] - Heap files and the heap page format
//!
//! # Quick Start
//! ```no_run
//! use std::sync::Arc;
//! use heapdb::common::config::StorageConfig;
//! use heapdb::storage::{DbFile, HeapFile};
//! use heapdb::tuple::{Field, Tuple, TupleDesc, Type};
//! use heapdb::{BufferPool, TransactionId};
//!
//! let pool = BufferPool::new(StorageConfig::default()).unwrap();
//! let desc = Arc::new(TupleDesc::from_types(&[Type::Int, Type::String]).unwrap());
//! let file = Arc::new(HeapFile::open_or_create("people.dat", desc.clone(), pool.page_size()).unwrap());
//! pool.register_file(file.clone()).unwrap();
//!
//! let txn = TransactionId::new();
//! let mut tuple = Tuple::new(desc, vec![Field::Int(1), Field::from("ada")]).unwrap();
//! pool.insert_tuple(txn, file.id(), &mut tuple).unwrap();
//! pool.transaction_complete(txn, true).unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod storage;
pub mod tuple;

// Re-export commonly used items at crate root for convenience
pub use common::config::DEFAULT_PAGE_SIZE;
pub use common::{Error, PageId, Permissions, RecordId, Result, TransactionId};

pub use buffer::{BufferPool, BufferPoolStats, PageRef, StatsSnapshot};
pub use storage::page::HeapPage;
pub use storage::{DbFile, DbFileIterator, HeapFile};
