//! The contract between the storage core and the query layer.

use std::sync::Arc;

use crate::buffer::{BufferPool, PageRef};
use crate::common::{PageId, Result, TransactionId};
use crate::storage::page::HeapPage;
use crate::tuple::{Tuple, TupleDesc};

/// A table's on-disk storage.
///
/// Byte-level methods (`read_page`, `write_page`) are what the buffer pool
/// calls on a miss or a write-back. Tuple-level methods go through the pool
/// passed in by the caller and never touch cached pages behind its back.
pub trait DbFile: Send + Sync {
    /// Table id; every [`PageId`] of this file carries it.
    fn id(&self) -> u32;

    fn tuple_desc(&self) -> &Arc<TupleDesc>;

    fn page_size(&self) -> usize;

    /// Number of pages currently in the file.
    fn num_pages(&self) -> Result<u32>;

    /// Read one page straight from disk.
    fn read_page(&self, pid: PageId) -> Result<HeapPage>;

    /// Overwrite one page on disk with `page`'s image.
    fn write_page(&self, page: &HeapPage) -> Result<()>;

    /// Store `tuple`, assigning its record id. Returns the pages modified.
    fn insert_tuple(
        &self,
        pool: &BufferPool,
        txn: TransactionId,
        tuple: &mut Tuple,
    ) -> Result<Vec<PageRef>>;

    /// Remove the tuple at `tuple`'s record id. Returns the pages modified.
    fn delete_tuple(&self, pool: &BufferPool, txn: TransactionId, tuple: &Tuple)
        -> Result<Vec<PageRef>>;

    /// Lazy scan over every live tuple, page by page.
    fn iterator<'a>(
        &'a self,
        pool: &'a BufferPool,
        txn: TransactionId,
    ) -> Box<dyn DbFileIterator + 'a>;
}

/// Restartable forward-only cursor over a file's tuples.
///
/// ```text
/// Closed ──open──▶ OnPage(0) ──▶ OnPage(k+1) ──▶ Exhausted ──close──▶ Closed
///                     ▲                                 │
///                     └─────────────rewind──────────────┘
/// ```
pub trait DbFileIterator {
    fn open(&mut self) -> Result<()>;

    /// `false` before `open`, after `close`, and once exhausted.
    fn has_next(&mut self) -> Result<bool>;

    /// # Errors
    /// `Error::NoSuchElement` when nothing is available.
    fn next(&mut self) -> Result<Tuple>;

    /// Close and reopen, replaying from the first page.
    fn rewind(&mut self) -> Result<()>;

    fn close(&mut self);
}
