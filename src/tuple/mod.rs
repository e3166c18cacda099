//! Schema and tuple types.
//!
//! - [`Type`] / [`Field`] - fixed-width typed values
//! - [`TupleDesc`] - ordered column list of a table
//! - [`Tuple`] - a row plus its optional [`RecordId`](crate::common::RecordId)

mod field;
#[allow(clippy::module_inception)]
mod tuple;
mod tuple_desc;

pub use field::{Field, Type};
pub use tuple::Tuple;
pub use tuple_desc::{TdItem, TupleDesc};
