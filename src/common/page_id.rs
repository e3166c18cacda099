//! Page and record identifier types.

use std::fmt;

/// Identifies a page on disk: the owning table plus a zero-based page number.
///
/// The table id is derived from the heap file's path, so a `PageId` is only
/// meaningful together with the file that produced it.
///
/// # Example
/// ```
/// use heapdb::PageId;
///
/// let page_id = PageId::new(3, 42);
/// assert_eq!(page_id.page_number(), 42);
/// assert_eq!(page_id.offset(4096), 42 * 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    table_id: u32,
    page_number: u32,
}

impl PageId {
    #[inline]
    pub fn new(table_id: u32, page_number: u32) -> Self {
        PageId {
            table_id,
            page_number,
        }
    }

    #[inline]
    pub fn table_id(&self) -> u32 {
        self.table_id
    }

    #[inline]
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Byte offset of this page inside its file.
    #[inline]
    pub fn offset(&self, page_size: usize) -> u64 {
        self.page_number as u64 * page_size as u64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({}:{})", self.table_id, self.page_number)
    }
}

/// A tuple's on-disk address: page plus slot number within that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    page_id: PageId,
    slot: usize,
}

impl RecordId {
    #[inline]
    pub fn new(page_id: PageId, slot: usize) -> Self {
        RecordId { page_id, slot }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.page_id, self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_page_id_structural_equality() {
        assert_eq!(PageId::new(1, 2), PageId::new(1, 2));
        assert_ne!(PageId::new(1, 2), PageId::new(2, 2));

        let set: HashSet<PageId> = [PageId::new(1, 2), PageId::new(1, 2)].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_page_id_offset() {
        assert_eq!(PageId::new(9, 0).offset(4096), 0);
        assert_eq!(PageId::new(9, 3).offset(20), 60);
        assert_eq!(PageId::new(9, u32::MAX).offset(4096), u32::MAX as u64 * 4096);
    }

    #[test]
    fn test_page_id_ordering() {
        assert!(PageId::new(1, 1) < PageId::new(1, 2));
        assert!(PageId::new(2, 0) > PageId::new(1, 9));
    }

    #[test]
    fn test_display() {
        let pid = PageId::new(5, 42);
        assert_eq!(format!("{}", pid), "Page(5:42)");
        assert_eq!(format!("{}", RecordId::new(pid, 3)), "Page(5:42)#3");
    }
}
