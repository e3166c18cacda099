//! Tuple schemas.

use std::fmt;

use crate::common::{Error, Result};
use crate::tuple::Type;

/// One column of a schema: its type and an optional name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TdItem {
    pub field_type: Type,
    pub name: Option<String>,
}

impl fmt::Display for TdItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}({})", name, self.field_type),
            None => write!(f, "({})", self.field_type),
        }
    }
}

/// Schema of a tuple: an ordered, non-empty list of typed columns.
///
/// Two schemas are equal when their column types match position by position;
/// names are ignored.
///
/// # Example
/// ```
/// use heapdb::tuple::{TupleDesc, Type};
///
/// let desc = TupleDesc::named(&[(Type::Int, "id"), (Type::String, "name")]).unwrap();
/// assert_eq!(desc.num_fields(), 2);
/// assert_eq!(desc.byte_size(), 4 + 132);
/// assert_eq!(desc.index_of("name"), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct TupleDesc {
    items: Vec<TdItem>,
}

impl TupleDesc {
    /// # Errors
    /// `Error::EmptySchema` if `items` is empty.
    pub fn new(items: Vec<TdItem>) -> Result<Self> {
        if items.is_empty() {
            return Err(Error::EmptySchema);
        }
        Ok(Self { items })
    }

    /// Schema with anonymous columns.
    pub fn from_types(types: &[Type]) -> Result<Self> {
        Self::new(
            types
                .iter()
                .map(|&field_type| TdItem {
                    field_type,
                    name: None,
                })
                .collect(),
        )
    }

    /// Schema with named columns.
    pub fn named(fields: &[(Type, &str)]) -> Result<Self> {
        Self::new(
            fields
                .iter()
                .map(|&(field_type, name)| TdItem {
                    field_type,
                    name: Some(name.to_string()),
                })
                .collect(),
        )
    }

    /// Concatenate two schemas, `first`'s columns before `second`'s.
    pub fn merge(first: &TupleDesc, second: &TupleDesc) -> TupleDesc {
        let mut items = first.items.clone();
        items.extend(second.items.iter().cloned());
        TupleDesc { items }
    }

    #[inline]
    pub fn num_fields(&self) -> usize {
        self.items.len()
    }

    pub fn field_type(&self, index: usize) -> Result<Type> {
        self.item(index).map(|item| item.field_type)
    }

    pub fn field_name(&self, index: usize) -> Result<Option<&str>> {
        self.item(index).map(|item| item.name.as_deref())
    }

    /// Index of the first column named `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.name.as_deref() == Some(name))
    }

    /// Serialized width of a tuple with this schema.
    pub fn byte_size(&self) -> usize {
        self.items.iter().map(|item| item.field_type.width()).sum()
    }

    pub fn items(&self) -> impl Iterator<Item = &TdItem> {
        self.items.iter()
    }

    fn item(&self, index: usize) -> Result<&TdItem> {
        self.items.get(index).ok_or(Error::FieldIndexOutOfRange {
            index,
            arity: self.items.len(),
        })
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .zip(&other.items)
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

impl Eq for TupleDesc {}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cols: Vec<String> = self.items.iter().map(|item| item.to_string()).collect();
        write!(f, "{}", cols.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_schema_rejected() {
        assert!(matches!(TupleDesc::from_types(&[]), Err(Error::EmptySchema)));
    }

    #[test]
    fn test_byte_size() {
        let desc = TupleDesc::from_types(&[Type::Int, Type::Int, Type::String]).unwrap();
        assert_eq!(desc.byte_size(), 4 + 4 + 132);
    }

    #[test]
    fn test_field_lookup() {
        let desc = TupleDesc::named(&[(Type::Int, "a"), (Type::String, "b")]).unwrap();
        assert_eq!(desc.field_type(1).unwrap(), Type::String);
        assert_eq!(desc.field_name(0).unwrap(), Some("a"));
        assert_eq!(desc.index_of("b"), Some(1));
        assert_eq!(desc.index_of("c"), None);
        assert!(desc.field_type(2).is_err());
    }

    #[test]
    fn test_equality_ignores_names() {
        let a = TupleDesc::named(&[(Type::Int, "x")]).unwrap();
        let b = TupleDesc::from_types(&[Type::Int]).unwrap();
        let c = TupleDesc::from_types(&[Type::String]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_merge() {
        let a = TupleDesc::named(&[(Type::Int, "x")]).unwrap();
        let b = TupleDesc::named(&[(Type::String, "y"), (Type::Int, "z")]).unwrap();
        let merged = TupleDesc::merge(&a, &b);

        assert_eq!(merged.num_fields(), 3);
        assert_eq!(merged.index_of("z"), Some(2));
        assert_eq!(merged.byte_size(), a.byte_size() + b.byte_size());
        assert_eq!(format!("{}", merged), "x(INT), y(STRING), z(INT)");
    }
}
