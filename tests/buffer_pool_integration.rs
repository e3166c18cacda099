//! Integration tests for the buffer pool.
//!
//! These tests verify cross-component behavior that unit tests don't cover.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use heapdb::common::config::StorageConfig;
use heapdb::storage::page::HeapPage;
use heapdb::storage::{DbFile, DbFileIterator, HeapFile};
use heapdb::tuple::{Field, Tuple, TupleDesc, Type};
use heapdb::{BufferPool, PageId, Permissions, TransactionId};
use tempfile::{tempdir, TempDir};

const PAGE_SIZE: usize = 20;

fn int_desc() -> Arc<TupleDesc> {
    Arc::new(TupleDesc::from_types(&[Type::Int]).unwrap())
}

fn int_tuple(desc: &Arc<TupleDesc>, v: i32) -> Tuple {
    Tuple::new(Arc::clone(desc), vec![Field::Int(v)]).unwrap()
}

/// Pool over one heap file pre-sized to `pages` blank pages.
fn create_pool(capacity: usize, pages: u32) -> (Arc<BufferPool>, Arc<HeapFile>, TempDir) {
    let dir = tempdir().unwrap();
    let file = Arc::new(HeapFile::create(dir.path().join("t.dat"), int_desc(), PAGE_SIZE).unwrap());
    for n in 0..pages {
        let pid = PageId::new(file.id(), n);
        file.write_page(&HeapPage::empty(pid, int_desc(), PAGE_SIZE).unwrap())
            .unwrap();
    }

    let pool = Arc::new(BufferPool::new(StorageConfig::new(PAGE_SIZE, capacity)).unwrap());
    pool.register_file(file.clone()).unwrap();
    (pool, file, dir)
}

fn count_tuples(pool: &BufferPool, file: &HeapFile) -> usize {
    let mut it = file.iterator(pool, TransactionId::new());
    it.open().unwrap();
    let mut n = 0;
    while it.has_next().unwrap() {
        it.next().unwrap();
        n += 1;
    }
    n
}

/// Dirty pages pushed out over many eviction cycles come back intact.
#[test]
fn test_data_persistence_across_evictions() {
    let (pool, file, _dir) = create_pool(2, 5);
    let desc = int_desc();
    let txn = TransactionId::new();

    for n in 0..5u32 {
        let pid = PageId::new(file.id(), n);
        let page = pool.get_page(txn, pid, Permissions::ReadWrite).unwrap();
        let mut guard = page.write();
        guard.insert_tuple(&int_tuple(&desc, n as i32 * 3)).unwrap();
        guard.mark_dirty(true, txn);
    }
    assert!(pool.stats().snapshot().evictions >= 3);

    for n in 0..5u32 {
        let pid = PageId::new(file.id(), n);
        let page = pool.get_page(txn, pid, Permissions::ReadOnly).unwrap();
        let guard = page.read();
        let tuple = guard.tuples().next().unwrap();
        assert_eq!(tuple.fields(), &[Field::Int(n as i32 * 3)]);
    }
}

/// A mutation through one handle is visible to the next fetch of the same page.
#[test]
fn test_coherence_before_eviction() {
    let (pool, file, _dir) = create_pool(4, 1);
    let desc = int_desc();
    let txn = TransactionId::new();
    let pid = PageId::new(file.id(), 0);

    pool.get_page(txn, pid, Permissions::ReadWrite)
        .unwrap()
        .write()
        .insert_tuple(&int_tuple(&desc, 42))
        .unwrap();

    let again = pool.get_page(txn, pid, Permissions::ReadOnly).unwrap();
    assert_eq!(again.read().num_empty_slots(), 3);

    // Never marked dirty, so nothing reached disk
    assert_eq!(file.read_page(pid).unwrap().num_empty_slots(), 4);
}

/// Many threads missing on the same page all get the same handle.
#[test]
fn test_concurrent_misses_share_one_page() {
    let (pool, file, _dir) = create_pool(4, 1);
    let pid = PageId::new(file.id(), 0);
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                pool.get_page(TransactionId::new(), pid, Permissions::ReadOnly)
                    .unwrap()
            })
        })
        .collect();

    let pages: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for page in &pages[1..] {
        assert!(Arc::ptr_eq(&pages[0], page));
    }

    let stats = pool.stats().snapshot();
    assert_eq!(stats.cache_misses, 1);
    assert_eq!(stats.cache_hits, 7);
}

/// Concurrent fetches over more pages than the pool holds.
#[test]
fn test_concurrent_fetches_under_pressure() {
    let (pool, file, _dir) = create_pool(3, 10);
    let table_id = file.id();

    // One fewer worker than cached pages, so a miss never finds them all held
    let handles: Vec<_> = (0..3)
        .map(|t| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let txn = TransactionId::new();
                for i in 0..50u32 {
                    let pid = PageId::new(table_id, (i * 7 + t) % 10);
                    let page = pool.get_page(txn, pid, Permissions::ReadOnly).unwrap();
                    assert_eq!(page.read().id(), pid);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(pool.cached_page_count() <= 3);
}

/// Concurrent inserters never lose a tuple or share a slot.
#[test]
fn test_concurrent_inserts() {
    let (pool, file, _dir) = create_pool(16, 0);
    let desc = int_desc();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let pool = Arc::clone(&pool);
            let desc = Arc::clone(&desc);
            let table_id = file.id();
            thread::spawn(move || {
                let txn = TransactionId::new();
                let mut rids = vec![];
                for i in 0..10 {
                    let mut tuple = int_tuple(&desc, t * 100 + i);
                    pool.insert_tuple(txn, table_id, &mut tuple).unwrap();
                    rids.push(tuple.record_id().unwrap());
                }
                pool.transaction_complete(txn, true).unwrap();
                rids
            })
        })
        .collect();

    let mut rids = HashSet::new();
    for handle in handles {
        for rid in handle.join().unwrap() {
            assert!(rids.insert(rid), "slot {rid} handed out twice");
        }
    }

    assert_eq!(rids.len(), 40);
    assert_eq!(count_tuples(&pool, &file), 40);
    assert_eq!(file.num_pages().unwrap(), 10);
}

/// Inserters sharing a pool smaller than the file never lose or double-book a slot.
///
/// Each worker holds at most one page at a time, so with as many workers as
/// cached pages a miss always finds an unpinned victim.
#[test]
fn test_concurrent_inserts_under_eviction() {
    const WORKERS: i32 = 2;
    const PER_WORKER: i32 = 40;
    const ROUNDS: i32 = 5;

    let (pool, file, dir) = create_pool(WORKERS as usize, 0);
    let desc = int_desc();

    let mut rids = HashSet::new();
    for round in 0..ROUNDS {
        let handles: Vec<_> = (0..WORKERS)
            .map(|t| {
                let pool = Arc::clone(&pool);
                let desc = Arc::clone(&desc);
                let table_id = file.id();
                thread::spawn(move || {
                    let txn = TransactionId::new();
                    let mut rids = vec![];
                    for i in 0..PER_WORKER {
                        let v = (round * WORKERS + t) * PER_WORKER + i;
                        let mut tuple = int_tuple(&desc, v);
                        pool.insert_tuple(txn, table_id, &mut tuple).unwrap();
                        rids.push(tuple.record_id().unwrap());
                    }
                    pool.transaction_complete(txn, true).unwrap();
                    rids
                })
            })
            .collect();

        for handle in handles {
            for rid in handle.join().unwrap() {
                assert!(rids.insert(rid), "round {round}: slot {rid} handed out twice");
            }
        }
    }
    pool.flush_all_pages().unwrap();

    // Rescan from disk through a fresh pool
    let reopened = Arc::new(HeapFile::open(dir.path().join("t.dat"), int_desc(), PAGE_SIZE).unwrap());
    let fresh = BufferPool::new(StorageConfig::new(PAGE_SIZE, 4)).unwrap();
    fresh.register_file(reopened.clone()).unwrap();

    let mut it = reopened.iterator(&fresh, TransactionId::new());
    it.open().unwrap();
    let mut values = vec![];
    while it.has_next().unwrap() {
        match it.next().unwrap().field(0).unwrap() {
            Field::Int(v) => values.push(*v),
            other => panic!("unexpected field {other}"),
        }
    }
    values.sort_unstable();

    let total = ROUNDS * WORKERS * PER_WORKER;
    assert_eq!(rids.len(), total as usize);
    assert_eq!(values, (0..total).collect::<Vec<_>>());
    assert_eq!(reopened.num_pages().unwrap(), (total as u32).div_ceil(4));
}

/// Commit persists across pool instances; abort leaves disk untouched.
#[test]
fn test_commit_and_abort_across_pools() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dat");
    let desc = int_desc();

    {
        let file = Arc::new(HeapFile::create(&path, Arc::clone(&desc), PAGE_SIZE).unwrap());
        let pool = BufferPool::new(StorageConfig::new(PAGE_SIZE, 8)).unwrap();
        pool.register_file(file.clone()).unwrap();

        let kept = TransactionId::new();
        for v in 0..3 {
            pool.insert_tuple(kept, file.id(), &mut int_tuple(&desc, v))
                .unwrap();
        }
        pool.transaction_complete(kept, true).unwrap();

        let dropped = TransactionId::new();
        pool.insert_tuple(dropped, file.id(), &mut int_tuple(&desc, 99))
            .unwrap();
        pool.transaction_complete(dropped, false).unwrap();

        // Aborted change is gone from this pool too
        assert_eq!(count_tuples(&pool, &file), 3);
    }

    {
        let file = Arc::new(HeapFile::open(&path, Arc::clone(&desc), PAGE_SIZE).unwrap());
        let pool = BufferPool::new(StorageConfig::new(PAGE_SIZE, 8)).unwrap();
        pool.register_file(file.clone()).unwrap();

        assert_eq!(count_tuples(&pool, &file), 3);
    }
}

/// Two files served by one pool keep their pages apart.
#[test]
fn test_two_files_one_pool() {
    let dir = tempdir().unwrap();
    let desc = int_desc();
    let a = Arc::new(HeapFile::create(dir.path().join("a.dat"), Arc::clone(&desc), PAGE_SIZE).unwrap());
    let b = Arc::new(HeapFile::create(dir.path().join("b.dat"), Arc::clone(&desc), PAGE_SIZE).unwrap());

    let pool = BufferPool::new(StorageConfig::new(PAGE_SIZE, 3)).unwrap();
    pool.register_file(a.clone()).unwrap();
    pool.register_file(b.clone()).unwrap();

    let txn = TransactionId::new();
    for v in 0..6 {
        pool.insert_tuple(txn, a.id(), &mut int_tuple(&desc, v)).unwrap();
    }
    for v in 0..9 {
        pool.insert_tuple(txn, b.id(), &mut int_tuple(&desc, v)).unwrap();
    }

    assert_eq!(count_tuples(&pool, &a), 6);
    assert_eq!(count_tuples(&pool, &b), 9);
    assert_eq!(a.num_pages().unwrap(), 2);
    assert_eq!(b.num_pages().unwrap(), 3);
}
