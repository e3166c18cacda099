//! Error types for heapdb.

use thiserror::Error;

use crate::common::{PageId, RecordId};

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in the storage core.
///
/// Cache misses are not errors; they surface as `None` from the cache. Running
/// out of free slots is not an error either; the heap file grows instead.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations. Never retried internally.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page lies outside its file.
    #[error("{0} not found")]
    PageNotFound(PageId),

    /// Page image has the wrong length for the configured page size.
    #[error("malformed page: expected {expected} bytes, got {actual}")]
    MalformedPage { expected: usize, actual: usize },

    /// The schema's tuples don't fit even once into a page.
    #[error("tuple of {tuple_size} bytes does not fit a {page_size}-byte page")]
    TupleTooLarge { tuple_size: usize, page_size: usize },

    /// A schema needs at least one field.
    #[error("schema has no fields")]
    EmptySchema,

    #[error("field index {index} out of range for {arity} fields")]
    FieldIndexOutOfRange { index: usize, arity: usize },

    #[error("field {index} does not match the schema type")]
    FieldTypeMismatch { index: usize },

    /// Tuple schema differs from the file/page schema.
    #[error("tuple schema does not match")]
    SchemaMismatch,

    /// Tuple has never been placed in a file.
    #[error("tuple has no record id")]
    MissingRecordId,

    #[error("slot for {0} is empty")]
    SlotEmpty(RecordId),

    #[error("{0} has no empty slots")]
    PageFull(PageId),

    /// Iterator asked for a tuple with nothing available.
    #[error("no more tuples")]
    NoSuchElement,

    /// `evict` called on a cache holding no pages.
    #[error("cannot evict from an empty cache")]
    CacheEmpty,

    /// Every cached page is still referenced by a caller, so none can be evicted.
    #[error("no evictable page: all {0} cached pages are in use")]
    NoFreeFrames(usize),

    /// No file registered with the buffer pool under this table id.
    #[error("unknown table {0}")]
    UnknownTable(u32),

    #[error("page size mismatch: pool uses {expected}, file uses {actual}")]
    PageSizeMismatch { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
