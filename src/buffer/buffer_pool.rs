//! Buffer Pool - the page caching layer between heap files and operators.
//!
//! The [`BufferPool`] provides:
//! - A bounded, LRU-ordered cache of deserialized pages
//! - Write-back of dirty victims before they leave the cache
//! - Per-transaction flush (commit) and discard (abort)
//! - A registry of the files pages are loaded from

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::{Mutex, RwLock};

use crate::buffer::{BufferPoolStats, PageCache};
use crate::common::{Error, PageId, Permissions, Result, StorageConfig, TransactionId};
use crate::storage::page::HeapPage;
use crate::storage::DbFile;
use crate::tuple::Tuple;

/// Shared handle to a resident page.
///
/// Every caller asking for the same cached [`PageId`] gets a clone of the same
/// `Arc`, so a mutation made through one handle is visible through all of them.
pub type PageRef = Arc<RwLock<HeapPage>>;

/// Caches pages of registered [`DbFile`]s.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────┐
/// │                        BufferPool                        │
/// │  ┌────────────────────────────┐   ┌──────────────────┐   │
/// │  │ cache: Mutex<PageCache>    │   │ files: RwLock    │   │
/// │  │ PageId → Arc<RwLock<Page>> │──▶│ table id → file  │   │
/// │  └────────────────────────────┘   └──────────────────┘   │
/// │  ┌────────────────────────────┐   ┌──────────────────┐   │
/// │  │ write_sets: Mutex          │   │ stats (atomic)   │   │
/// │  │ txn → {PageId}             │   │                  │   │
/// │  └────────────────────────────┘   └──────────────────┘   │
/// └──────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `cache`: `Mutex`. A miss holds it across the disk read, the victim
///   write-back and the insert, so two threads missing on the same page end up
///   sharing one `PageRef`.
/// - `files`: `RwLock`. Looked up on every miss, written only on register/close.
/// - `write_sets`: `Mutex`. Touched on read-write fetches and transaction end.
/// - `stats`: no lock, atomic counters.
///
/// Locks are taken in the order cache → files → page → file handle. Never call
/// back into the pool while holding a page guard.
///
/// # Usage
/// ```ignore
/// let pool = Arc::new(BufferPool::new(StorageConfig::default())?);
/// let file = Arc::new(HeapFile::create("t.dat", desc, pool.page_size())?);
/// pool.register_file(file.clone())?;
///
/// let txn = TransactionId::new();
/// pool.insert_tuple(txn, file.id(), &mut tuple)?;
/// pool.transaction_complete(txn, true)?;
/// ```
pub struct BufferPool {
    config: StorageConfig,

    /// Resident pages in LRU order.
    cache: Mutex<PageCache<PageId, PageRef>>,

    /// Files this pool can read from and write back to.
    files: RwLock<HashMap<u32, Arc<dyn DbFile>>>,

    /// Pages each live transaction fetched read-write.
    write_sets: Mutex<HashMap<TransactionId, HashSet<PageId>>>,

    stats: BufferPoolStats,
}

impl BufferPool {
    /// # Errors
    /// `Error::InvalidConfig` if the page size or capacity is 0.
    pub fn new(config: StorageConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            cache: Mutex::new(PageCache::new(config.pool_capacity)?),
            config,
            files: RwLock::new(HashMap::new()),
            write_sets: Mutex::new(HashMap::new()),
            stats: BufferPoolStats::new(),
        })
    }

    /// Default page size, `capacity` pages.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::new(StorageConfig::default().with_pool_capacity(capacity))
    }

    // ========================================================================
    // File registry
    // ========================================================================

    /// Make `file`'s pages loadable through this pool.
    ///
    /// Registering the same table id again replaces the previous handle.
    ///
    /// # Errors
    /// `Error::PageSizeMismatch` if the file's page size differs from the pool's.
    pub fn register_file(&self, file: Arc<dyn DbFile>) -> Result<()> {
        if file.page_size() != self.config.page_size {
            return Err(Error::PageSizeMismatch {
                expected: self.config.page_size,
                actual: file.page_size(),
            });
        }

        debug!("registered table {}", file.id());
        self.files.write().insert(file.id(), file);
        Ok(())
    }

    /// # Errors
    /// `Error::UnknownTable` if nothing is registered under `table_id`.
    pub fn file(&self, table_id: u32) -> Result<Arc<dyn DbFile>> {
        self.files
            .read()
            .get(&table_id)
            .cloned()
            .ok_or(Error::UnknownTable(table_id))
    }

    /// Flush and drop every cached page of `table_id`, then deregister it.
    pub fn close_file(&self, table_id: u32) -> Result<()> {
        {
            let mut cache = self.cache.lock();
            let pids: Vec<PageId> = cache
                .keys()
                .filter(|pid| pid.table_id() == table_id)
                .copied()
                .collect();

            for pid in pids {
                if let Some(page) = cache.peek(&pid).cloned() {
                    self.write_back(pid, &page)?;
                    cache.remove(&pid);
                }
            }
        }

        self.files.write().remove(&table_id);
        debug!("closed table {}", table_id);
        Ok(())
    }

    // ========================================================================
    // Page access
    // ========================================================================

    /// Fetch a page, loading it from its file on a miss.
    ///
    /// `mode` records intent only: with [`Permissions::ReadWrite`] the page
    /// joins `txn`'s write set, which [`holds_write`](Self::holds_write)
    /// reports. It takes no lock on the page's contents.
    ///
    /// # Errors
    /// - `Error::UnknownTable` if the page's file isn't registered
    /// - `Error::PageNotFound` if the page lies past the end of its file
    /// - `Error::Io` if reading the page, or writing back a dirty victim, fails
    /// - `Error::NoFreeFrames` if the pool is full and every page is held by a caller
    pub fn get_page(&self, txn: TransactionId, pid: PageId, mode: Permissions) -> Result<PageRef> {
        let page = {
            let mut cache = self.cache.lock();

            if let Some(page) = cache.get(&pid).cloned() {
                BufferPoolStats::bump(&self.stats.cache_hits);
                trace!("{} hit for {}", pid, txn);
                page
            } else {
                BufferPoolStats::bump(&self.stats.cache_misses);
                trace!("{} miss for {}", pid, txn);

                let loaded = self.file(pid.table_id())?.read_page(pid)?;
                BufferPoolStats::bump(&self.stats.pages_read);

                if cache.len() >= cache.capacity() {
                    self.evict_locked(&mut cache)?;
                }

                let page = Arc::new(RwLock::new(loaded));
                cache.put(pid, Arc::clone(&page));
                page
            }
        };

        if mode.allows_write() {
            self.write_sets.lock().entry(txn).or_default().insert(pid);
        }

        Ok(page)
    }

    /// Whether `txn` has fetched `pid` with [`Permissions::ReadWrite`].
    pub fn holds_write(&self, txn: TransactionId, pid: PageId) -> bool {
        self.write_sets
            .lock()
            .get(&txn)
            .is_some_and(|pages| pages.contains(&pid))
    }

    // ========================================================================
    // Eviction and write-back
    // ========================================================================

    /// Push the least-recently-used unpinned page out, writing it back first if dirty.
    ///
    /// A page is pinned while any `PageRef` besides the cache's own is alive;
    /// new handles are only cloned under the cache mutex, so the count cannot
    /// grow while we hold it. The victim is only removed once its write-back
    /// succeeded; on error it stays cached and the error is returned.
    ///
    /// # Errors
    /// - `Error::CacheEmpty` if nothing is cached
    /// - `Error::NoFreeFrames` if every cached page is pinned
    fn evict_locked(&self, cache: &mut PageCache<PageId, PageRef>) -> Result<()> {
        if cache.is_empty() {
            return Err(Error::CacheEmpty);
        }

        let (pid, page) = cache
            .iter()
            .find(|(_, page)| Arc::strong_count(page) == 1)
            .map(|(pid, page)| (*pid, Arc::clone(page)))
            .ok_or(Error::NoFreeFrames(cache.len()))?;

        self.write_back(pid, &page)?;
        cache.remove(&pid);

        BufferPoolStats::bump(&self.stats.evictions);
        debug!("evicted {}", pid);
        Ok(())
    }

    /// Write `page` to its file if dirty and mark it clean. Clean pages are skipped.
    fn write_back(&self, pid: PageId, page: &PageRef) -> Result<()> {
        let mut guard = page.write();
        let Some(txn) = guard.is_dirty() else {
            return Ok(());
        };

        self.file(pid.table_id())?.write_page(&guard)?;
        guard.mark_dirty(false, txn);

        BufferPoolStats::bump(&self.stats.pages_written);
        debug!("wrote back {} dirtied by {}", pid, txn);
        Ok(())
    }

    /// Write back one page if it is cached and dirty. It stays cached.
    pub fn flush_page(&self, pid: PageId) -> Result<()> {
        let cache = self.cache.lock();
        match cache.peek(&pid) {
            Some(page) => self.write_back(pid, page),
            None => Ok(()),
        }
    }

    /// Write back every dirty cached page.
    pub fn flush_all_pages(&self) -> Result<()> {
        let cache = self.cache.lock();
        for (pid, page) in cache.iter() {
            self.write_back(*pid, page)?;
        }
        Ok(())
    }

    /// Write back every cached page dirtied by `txn`.
    pub fn flush_pages(&self, txn: TransactionId) -> Result<()> {
        let cache = self.cache.lock();
        for (pid, page) in cache.iter() {
            if page.read().is_dirty() == Some(txn) {
                self.write_back(*pid, page)?;
            }
        }
        Ok(())
    }

    /// Drop a page from the cache without writing it back.
    pub fn discard_page(&self, pid: PageId) {
        if self.cache.lock().remove(&pid).is_some() {
            BufferPoolStats::bump(&self.stats.discards);
            debug!("discarded {}", pid);
        }
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Finish `txn`: on commit flush its dirty pages, on abort drop them so the
    /// next access rereads the on-disk image.
    pub fn transaction_complete(&self, txn: TransactionId, commit: bool) -> Result<()> {
        if commit {
            self.flush_pages(txn)?;
        } else {
            let mut cache = self.cache.lock();
            let dirtied: Vec<PageId> = cache
                .iter()
                .filter(|(_, page)| page.read().is_dirty() == Some(txn))
                .map(|(pid, _)| *pid)
                .collect();

            for pid in dirtied {
                cache.remove(&pid);
                BufferPoolStats::bump(&self.stats.discards);
            }
        }

        self.write_sets.lock().remove(&txn);
        debug!("{} {}", txn, if commit { "committed" } else { "aborted" });
        Ok(())
    }

    /// Insert `tuple` into table `table_id` on behalf of `txn`.
    ///
    /// The tuple receives its record id. Every page the file modified is left
    /// dirty and resident.
    pub fn insert_tuple(&self, txn: TransactionId, table_id: u32, tuple: &mut Tuple) -> Result<()> {
        let file = self.file(table_id)?;
        let pages = file.insert_tuple(self, txn, tuple)?;
        self.adopt_dirty(txn, pages)
    }

    /// Delete `tuple` from the table its record id points into.
    pub fn delete_tuple(&self, txn: TransactionId, tuple: &Tuple) -> Result<()> {
        let pid = tuple.record_id().ok_or(Error::MissingRecordId)?.page_id();
        let file = self.file(pid.table_id())?;
        let pages = file.delete_tuple(self, txn, tuple)?;
        self.adopt_dirty(txn, pages)
    }

    /// Mark each page dirty by `txn`.
    ///
    /// The pages are pinned by the caller's handles, so eviction never drops
    /// them; only an explicit discard can, in which case the page is put back.
    fn adopt_dirty(&self, txn: TransactionId, pages: Vec<PageRef>) -> Result<()> {
        for page in pages {
            let pid = {
                let mut guard = page.write();
                guard.mark_dirty(true, txn);
                guard.id()
            };

            let mut cache = self.cache.lock();
            if !cache.contains_key(&pid) {
                if cache.len() >= cache.capacity() {
                    self.evict_locked(&mut cache)?;
                }
                cache.put(pid, page);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    pub fn capacity(&self) -> usize {
        self.config.pool_capacity
    }

    pub fn cached_page_count(&self) -> usize {
        self.cache.lock().len()
    }

    /// Whether `pid` is resident, without touching its recency.
    pub fn is_cached(&self, pid: PageId) -> bool {
        self.cache.lock().contains_key(&pid)
    }

    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }
}
