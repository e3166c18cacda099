//! Heap File - a table stored as an unordered sequence of fixed-size pages.
//!
//! The [`HeapFile`] handles:
//! - Reading and writing individual pages by offset
//! - Finding space for new tuples (first fit, growing the file when full)
//! - Lazy cross-page scans through the buffer pool

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::buffer::{BufferPool, PageRef};
use crate::common::{Error, PageId, Permissions, Result, TransactionId};
use crate::storage::page::HeapPage;
use crate::storage::{DbFile, DbFileIterator};
use crate::tuple::{Tuple, TupleDesc};

/// Disk-resident collection of same-size [`HeapPage`]s.
///
/// # File Layout
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │  ...    │ Page N  │
/// └─────────┴─────────┴─────────┴─────────┘
/// Offset:  0   page_size   ...   N×page_size
/// ```
///
/// The page count is always derived from the file length, so it reflects
/// appends made by concurrent inserts. Pages are never removed; a page whose
/// slots are all empty stays in place and is reused by later inserts.
///
/// # Thread Safety
/// The file handle sits behind a mutex so each seek+read/write pair is atomic.
/// A second mutex serializes appends so two inserters never claim the same
/// new page number.
pub struct HeapFile {
    path: PathBuf,
    table_id: u32,
    desc: Arc<TupleDesc>,
    page_size: usize,
    file: Mutex<File>,
    append_lock: Mutex<()>,
}

impl HeapFile {
    /// Create a new, empty heap file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created, or
    /// if a tuple of `desc` does not fit in `page_size` bytes.
    pub fn create<P: AsRef<Path>>(path: P, desc: Arc<TupleDesc>, page_size: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        Self::from_file(path.as_ref(), file, desc, page_size)
    }

    /// Open an existing heap file.
    pub fn open<P: AsRef<Path>>(path: P, desc: Arc<TupleDesc>, page_size: usize) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        Self::from_file(path.as_ref(), file, desc, page_size)
    }

    /// Open an existing heap file, or create it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(
        path: P,
        desc: Arc<TupleDesc>,
        page_size: usize,
    ) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path, desc, page_size)
        } else {
            Self::create(path, desc, page_size)
        }
    }

    fn from_file(path: &Path, file: File, desc: Arc<TupleDesc>, page_size: usize) -> Result<Self> {
        if HeapPage::slots_per_page(page_size, desc.byte_size()) == 0 {
            return Err(Error::TupleTooLarge {
                tuple_size: desc.byte_size(),
                page_size,
            });
        }

        let path = path.canonicalize()?;
        let table_id = crc32fast::hash(path.to_string_lossy().as_bytes());

        Ok(Self {
            path,
            table_id,
            desc,
            page_size,
            file: Mutex::new(file),
            append_lock: Mutex::new(()),
        })
    }

    /// Absolute path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_owned(&self, pid: PageId) -> Result<()> {
        if pid.table_id() != self.table_id {
            return Err(Error::PageNotFound(pid));
        }
        Ok(())
    }

    /// Mark a page dirty on behalf of `txn`, which must have fetched it read-write.
    fn mark_dirty(pool: &BufferPool, txn: TransactionId, page: &mut HeapPage) {
        debug_assert!(
            pool.holds_write(txn, page.id()),
            "{} marks {} dirty without read-write access",
            txn,
            page.id()
        );
        page.mark_dirty(true, txn);
    }

    /// Place `tuple` on `pid` if it has a free slot.
    fn try_insert(
        &self,
        pool: &BufferPool,
        txn: TransactionId,
        pid: PageId,
        tuple: &mut Tuple,
    ) -> Result<Option<PageRef>> {
        let page = pool.get_page(txn, pid, Permissions::ReadWrite)?;
        let rid = {
            let mut guard = page.write();
            if guard.num_empty_slots() == 0 {
                return Ok(None);
            }
            let rid = guard.insert_tuple(tuple)?;
            Self::mark_dirty(pool, txn, &mut guard);
            rid
        };

        tuple.set_record_id(Some(rid));
        Ok(Some(page))
    }

    /// Write a blank page at the end of the file and return its id.
    fn append_empty_page(&self) -> Result<PageId> {
        let pid = PageId::new(self.table_id, self.num_pages()?);
        let blank = HeapPage::empty(pid, Arc::clone(&self.desc), self.page_size)?;
        self.write_page(&blank)?;

        debug!("{}: appended {}", self.path.display(), pid);
        Ok(pid)
    }
}

impl DbFile for HeapFile {
    /// CRC32 of the canonical path, stable across reopenings.
    fn id(&self) -> u32 {
        self.table_id
    }

    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn num_pages(&self) -> Result<u32> {
        let len = self.file.lock().metadata()?.len();
        Ok(len.div_ceil(self.page_size as u64) as u32)
    }

    /// # Errors
    /// - `Error::PageNotFound` if `pid` belongs to another file or lies past the end
    /// - `Error::Io` on a short read
    fn read_page(&self, pid: PageId) -> Result<HeapPage> {
        self.check_owned(pid)?;
        if pid.page_number() >= self.num_pages()? {
            return Err(Error::PageNotFound(pid));
        }

        let mut data = vec![0u8; self.page_size];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(pid.offset(self.page_size)))?;
            file.read_exact(&mut data)?;
        }

        HeapPage::from_bytes(pid, Arc::clone(&self.desc), self.page_size, &data)
    }

    /// Overwrites in place; writing at `num_pages()` is how the file grows.
    fn write_page(&self, page: &HeapPage) -> Result<()> {
        self.check_owned(page.id())?;

        let data = page.to_bytes();
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(page.id().offset(self.page_size)))?;
        file.write_all(&data)?;
        file.sync_data()?;

        Ok(())
    }

    /// First fit by page order; appends one page only when every page is full.
    fn insert_tuple(
        &self,
        pool: &BufferPool,
        txn: TransactionId,
        tuple: &mut Tuple,
    ) -> Result<Vec<PageRef>> {
        if **tuple.desc() != *self.desc {
            return Err(Error::SchemaMismatch);
        }

        let mut scanned = 0;
        loop {
            let num_pages = self.num_pages()?;
            for page_number in scanned..num_pages {
                let pid = PageId::new(self.table_id, page_number);
                if let Some(page) = self.try_insert(pool, txn, pid, tuple)? {
                    return Ok(vec![page]);
                }
            }
            scanned = num_pages;

            // Serializes appends so two inserters never claim the same page number
            let _append = self.append_lock.lock();
            if self.num_pages()? != num_pages {
                // Another inserter appended while we scanned
                continue;
            }

            // Scanners don't take the append lock, so they may fill the new
            // page before we reach it; then go around again.
            let pid = self.append_empty_page()?;
            if let Some(page) = self.try_insert(pool, txn, pid, tuple)? {
                return Ok(vec![page]);
            }
        }
    }

    /// # Errors
    /// - `Error::MissingRecordId` if `tuple` was never stored
    /// - `Error::PageNotFound` if its record id is outside this file
    /// - `Error::SlotEmpty` if the slot holds nothing
    fn delete_tuple(
        &self,
        pool: &BufferPool,
        txn: TransactionId,
        tuple: &Tuple,
    ) -> Result<Vec<PageRef>> {
        let pid = tuple.record_id().ok_or(Error::MissingRecordId)?.page_id();
        self.check_owned(pid)?;
        if pid.page_number() >= self.num_pages()? {
            return Err(Error::PageNotFound(pid));
        }

        let page = pool.get_page(txn, pid, Permissions::ReadWrite)?;
        {
            let mut guard = page.write();
            guard.delete_tuple(tuple)?;
            Self::mark_dirty(pool, txn, &mut guard);
        }

        Ok(vec![page])
    }

    fn iterator<'a>(
        &'a self,
        pool: &'a BufferPool,
        txn: TransactionId,
    ) -> Box<dyn DbFileIterator + 'a> {
        Box::new(HeapFileIterator::new(self, pool, txn))
    }
}

// ============================================================================
// Iterator
// ============================================================================

enum ScanState {
    Closed,
    /// Tuples of `page_number` not yet returned; `num_pages` is fixed at open.
    OnPage {
        page_number: u32,
        num_pages: u32,
        tuples: std::vec::IntoIter<Tuple>,
    },
    Exhausted,
}

/// Cursor over a [`HeapFile`], fetching one page at a time read-only.
///
/// The live tuples of the current page are copied out when the page is
/// fetched, so no page lock is held between calls.
pub struct HeapFileIterator<'a> {
    file: &'a HeapFile,
    pool: &'a BufferPool,
    txn: TransactionId,
    state: ScanState,
}

impl<'a> HeapFileIterator<'a> {
    pub fn new(file: &'a HeapFile, pool: &'a BufferPool, txn: TransactionId) -> Self {
        Self {
            file,
            pool,
            txn,
            state: ScanState::Closed,
        }
    }

    fn load(&self, page_number: u32, num_pages: u32) -> Result<ScanState> {
        let pid = PageId::new(self.file.table_id, page_number);
        let page = self.pool.get_page(self.txn, pid, Permissions::ReadOnly)?;
        let tuples: Vec<Tuple> = page.read().tuples().cloned().collect();

        Ok(ScanState::OnPage {
            page_number,
            num_pages,
            tuples: tuples.into_iter(),
        })
    }
}

impl DbFileIterator for HeapFileIterator<'_> {
    fn open(&mut self) -> Result<()> {
        let num_pages = self.file.num_pages()?;
        self.state = if num_pages == 0 {
            ScanState::Exhausted
        } else {
            self.load(0, num_pages)?
        };
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        loop {
            let (next_page, num_pages) = match &self.state {
                ScanState::Closed | ScanState::Exhausted => return Ok(false),
                ScanState::OnPage {
                    page_number,
                    num_pages,
                    tuples,
                } => {
                    if !tuples.as_slice().is_empty() {
                        return Ok(true);
                    }
                    (page_number + 1, *num_pages)
                }
            };

            self.state = if next_page < num_pages {
                self.load(next_page, num_pages)?
            } else {
                ScanState::Exhausted
            };
        }
    }

    fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(Error::NoSuchElement);
        }
        match &mut self.state {
            ScanState::OnPage { tuples, .. } => tuples.next().ok_or(Error::NoSuchElement),
            _ => Err(Error::NoSuchElement),
        }
    }

    fn rewind(&mut self) -> Result<()> {
        self.close();
        self.open()
    }

    fn close(&mut self) {
        self.state = ScanState::Closed;
    }
}
