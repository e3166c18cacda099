//! HeapPage - fixed-size page of same-width tuple slots.
//!
//! A [`HeapPage`] is the in-memory form of one page of a heap file. It is
//! deserialized from exactly `page_size` bytes and serializes back to the same
//! length.

use std::sync::Arc;

use crate::common::{Error, PageId, RecordId, Result, TransactionId};
use crate::tuple::{Tuple, TupleDesc};

/// A page holding a bitmap header and an array of tuple slots.
///
/// # Layout
/// ```text
/// ┌──────────────────┬────────┬────────┬─────┬──────────┬─────────┐
/// │ header bitmap    │ slot 0 │ slot 1 │ ... │ slot N-1 │ padding │
/// │ ceil(N / 8) bytes│        │        │     │          │ (zeros) │
/// └──────────────────┴────────┴────────┴─────┴──────────┴─────────┘
/// ```
///
/// - `N = floor(page_size * 8 / (tuple_size * 8 + 1))`: every slot costs its
///   tuple bytes plus one header bit.
/// - Slot `i` is occupied when bit `i % 8` (least-significant first) of header
///   byte `i / 8` is set.
/// - Empty slots are zero-filled.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use heapdb::PageId;
/// use heapdb::storage::page::HeapPage;
/// use heapdb::tuple::{TupleDesc, Type};
///
/// let desc = Arc::new(TupleDesc::from_types(&[Type::Int]).unwrap());
/// let page = HeapPage::empty(PageId::new(1, 0), desc, 20).unwrap();
/// assert_eq!(page.num_slots(), 4);
/// assert_eq!(page.num_empty_slots(), 4);
/// ```
#[derive(Debug)]
pub struct HeapPage {
    pid: PageId,
    desc: Arc<TupleDesc>,
    page_size: usize,
    header: Vec<u8>,
    tuples: Vec<Option<Tuple>>,
    dirtied_by: Option<TransactionId>,
}

impl HeapPage {
    /// Number of slots a page of `page_size` bytes holds for `tuple_size`-byte tuples.
    pub fn slots_per_page(page_size: usize, tuple_size: usize) -> usize {
        (page_size * 8) / (tuple_size * 8 + 1)
    }

    /// Bytes needed for a bitmap of `num_slots` bits.
    pub fn header_size(num_slots: usize) -> usize {
        num_slots.div_ceil(8)
    }

    /// Image of a page with every slot empty.
    pub fn empty_page_data(page_size: usize) -> Vec<u8> {
        vec![0u8; page_size]
    }

    /// Build a page with no tuples.
    pub fn empty(pid: PageId, desc: Arc<TupleDesc>, page_size: usize) -> Result<Self> {
        Self::from_bytes(pid, desc, page_size, &Self::empty_page_data(page_size))
    }

    /// Deserialize a page image.
    ///
    /// # Errors
    /// - `Error::MalformedPage` if `data` is not exactly `page_size` bytes, or a
    ///   stored field can't be decoded
    /// - `Error::TupleTooLarge` if not even one tuple fits the page
    pub fn from_bytes(
        pid: PageId,
        desc: Arc<TupleDesc>,
        page_size: usize,
        data: &[u8],
    ) -> Result<Self> {
        if data.len() != page_size {
            return Err(Error::MalformedPage {
                expected: page_size,
                actual: data.len(),
            });
        }

        let tuple_size = desc.byte_size();
        let num_slots = Self::slots_per_page(page_size, tuple_size);
        if num_slots == 0 {
            return Err(Error::TupleTooLarge {
                tuple_size,
                page_size,
            });
        }

        let header_size = Self::header_size(num_slots);
        let header = data[..header_size].to_vec();

        let mut tuples = Vec::with_capacity(num_slots);
        for slot in 0..num_slots {
            if bit_is_set(&header, slot) {
                let start = header_size + slot * tuple_size;
                let mut tuple = Tuple::read_from(&desc, &data[start..start + tuple_size])?;
                tuple.set_record_id(Some(RecordId::new(pid, slot)));
                tuples.push(Some(tuple));
            } else {
                tuples.push(None);
            }
        }

        Ok(Self {
            pid,
            desc,
            page_size,
            header,
            tuples,
            dirtied_by: None,
        })
    }

    /// Serialize to exactly `page_size` bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let tuple_size = self.desc.byte_size();
        let header_size = self.header.len();

        let mut data = Self::empty_page_data(self.page_size);
        data[..header_size].copy_from_slice(&self.header);

        for (slot, tuple) in self.tuples.iter().enumerate() {
            if let Some(tuple) = tuple {
                let start = header_size + slot * tuple_size;
                tuple.write_to(&mut data[start..start + tuple_size]);
            }
        }

        data
    }

    #[inline]
    pub fn id(&self) -> PageId {
        self.pid
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[inline]
    pub fn num_slots(&self) -> usize {
        self.tuples.len()
    }

    /// Number of unset header bits.
    pub fn num_empty_slots(&self) -> usize {
        (0..self.num_slots())
            .filter(|&slot| !self.is_slot_used(slot))
            .count()
    }

    pub fn is_slot_used(&self, slot: usize) -> bool {
        slot < self.num_slots() && bit_is_set(&self.header, slot)
    }

    /// Place a copy of `tuple` in the first empty slot.
    ///
    /// Returns the record id assigned to the stored copy.
    ///
    /// # Errors
    /// - `Error::SchemaMismatch` if the tuple's schema differs from the page's
    /// - `Error::PageFull` if no slot is free
    pub fn insert_tuple(&mut self, tuple: &Tuple) -> Result<RecordId> {
        if **tuple.desc() != *self.desc {
            return Err(Error::SchemaMismatch);
        }

        let slot = (0..self.num_slots())
            .find(|&slot| !self.is_slot_used(slot))
            .ok_or(Error::PageFull(self.pid))?;

        let rid = RecordId::new(self.pid, slot);
        let mut stored = tuple.clone();
        stored.set_record_id(Some(rid));

        set_bit(&mut self.header, slot, true);
        self.tuples[slot] = Some(stored);

        Ok(rid)
    }

    /// Clear the slot named by the tuple's record id.
    ///
    /// # Errors
    /// - `Error::MissingRecordId` if the tuple was never stored
    /// - `Error::PageNotFound` if the record id points at another page
    /// - `Error::SlotEmpty` if the slot is already free
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> Result<()> {
        let rid = tuple.record_id().ok_or(Error::MissingRecordId)?;
        if rid.page_id() != self.pid {
            return Err(Error::PageNotFound(rid.page_id()));
        }
        if !self.is_slot_used(rid.slot()) {
            return Err(Error::SlotEmpty(rid));
        }

        set_bit(&mut self.header, rid.slot(), false);
        self.tuples[rid.slot()] = None;

        Ok(())
    }

    /// Live tuples in slot order.
    pub fn tuples(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter().flatten()
    }

    /// Set or clear the dirty flag, remembering which transaction dirtied the page.
    pub fn mark_dirty(&mut self, dirty: bool, txn: TransactionId) {
        self.dirtied_by = if dirty { Some(txn) } else { None };
    }

    /// The transaction that last dirtied this page, if it is dirty.
    #[inline]
    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirtied_by
    }
}

fn bit_is_set(header: &[u8], slot: usize) -> bool {
    header[slot / 8] & (1 << (slot % 8)) != 0
}

fn set_bit(header: &mut [u8], slot: usize, value: bool) {
    if value {
        header[slot / 8] |= 1 << (slot % 8);
    } else {
        header[slot / 8] &= !(1 << (slot % 8));
    }
}

// ============================================================================
// TESTS
// ============================================================================
