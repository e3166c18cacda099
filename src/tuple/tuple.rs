//! Tuples: field values plus an optional on-disk location.

use std::fmt;
use std::sync::Arc;

use crate::common::{Error, RecordId, Result};
use crate::tuple::{Field, TupleDesc};

/// A row of values matching a [`TupleDesc`].
///
/// A freshly built tuple has no [`RecordId`]; the heap file assigns one when it
/// places the tuple in a slot.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use heapdb::tuple::{Field, Tuple, TupleDesc, Type};
///
/// let desc = Arc::new(TupleDesc::from_types(&[Type::Int, Type::String]).unwrap());
/// let tuple = Tuple::new(desc, vec![Field::Int(1), Field::from("one")]).unwrap();
/// assert!(tuple.record_id().is_none());
/// assert_eq!(tuple.to_string(), "1\tone");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    desc: Arc<TupleDesc>,
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// # Errors
    /// - `Error::FieldIndexOutOfRange` if the arity doesn't match the schema
    /// - `Error::FieldTypeMismatch` if a value has the wrong type
    pub fn new(desc: Arc<TupleDesc>, fields: Vec<Field>) -> Result<Self> {
        if fields.len() != desc.num_fields() {
            return Err(Error::FieldIndexOutOfRange {
                index: fields.len(),
                arity: desc.num_fields(),
            });
        }
        for (index, field) in fields.iter().enumerate() {
            if desc.field_type(index)? != field.field_type() {
                return Err(Error::FieldTypeMismatch { index });
            }
        }

        Ok(Self {
            desc,
            fields,
            record_id: None,
        })
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn field(&self, index: usize) -> Result<&Field> {
        self.fields.get(index).ok_or(Error::FieldIndexOutOfRange {
            index,
            arity: self.fields.len(),
        })
    }

    pub fn set_field(&mut self, index: usize, field: Field) -> Result<()> {
        if self.desc.field_type(index)? != field.field_type() {
            return Err(Error::FieldTypeMismatch { index });
        }
        self.fields[index] = field;
        Ok(())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }

    /// Encode into a slot of exactly `desc.byte_size()` bytes.
    pub(crate) fn write_to(&self, out: &mut [u8]) {
        let mut offset = 0;
        for field in &self.fields {
            let len = field.field_type().width();
            field.write_to(&mut out[offset..offset + len]);
            offset += len;
        }
    }

    /// Decode a slot written by [`Tuple::write_to`].
    pub(crate) fn read_from(desc: &Arc<TupleDesc>, bytes: &[u8]) -> Result<Self> {
        let mut fields = Vec::with_capacity(desc.num_fields());
        let mut offset = 0;
        for item in desc.items() {
            let len = item.field_type.width();
            fields.push(item.field_type.parse(&bytes[offset..offset + len])?);
            offset += len;
        }
        Tuple::new(Arc::clone(desc), fields)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cols: Vec<String> = self.fields.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", cols.join("\t"))
    }
}
