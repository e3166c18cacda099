//! Field types and values.
//!
//! Every type has a fixed serialized width so that tuples of one schema all
//! occupy the same number of bytes in a page slot.
//!
//! # Encoding
//! ```text
//! Int     4 bytes          big-endian i32
//! String  4 + STRING_LEN   big-endian u32 length, then zero-padded bytes
//! ```

use std::fmt;

use crate::common::config::STRING_LEN;
use crate::common::{Error, Result};

/// Type of a field in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    String,
}

impl Type {
    /// Serialized width of a field of this type.
    #[inline]
    pub const fn width(&self) -> usize {
        match self {
            Type::Int => 4,
            Type::String => 4 + STRING_LEN,
        }
    }

    /// Decode one field of this type from exactly `self.width()` bytes.
    pub fn parse(&self, bytes: &[u8]) -> Result<Field> {
        if bytes.len() != self.width() {
            return Err(Error::MalformedPage {
                expected: self.width(),
                actual: bytes.len(),
            });
        }

        match self {
            Type::Int => Ok(Field::Int(i32::from_be_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ]))),
            Type::String => {
                let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
                if len > STRING_LEN {
                    return Err(Error::MalformedPage {
                        expected: STRING_LEN,
                        actual: len,
                    });
                }
                let text = String::from_utf8_lossy(&bytes[4..4 + len]).into_owned();
                Ok(Field::String(text))
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "INT"),
            Type::String => write!(f, "STRING"),
        }
    }
}

/// A single typed value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Int(i32),
    String(String),
}

impl Field {
    pub fn field_type(&self) -> Type {
        match self {
            Field::Int(_) => Type::Int,
            Field::String(_) => Type::String,
        }
    }

    /// Encode into `out`, which must be exactly `self.field_type().width()` bytes.
    ///
    /// Strings longer than `STRING_LEN` bytes are truncated at the last
    /// character boundary that fits.
    pub fn write_to(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.field_type().width());

        match self {
            Field::Int(v) => out.copy_from_slice(&v.to_be_bytes()),
            Field::String(s) => {
                let bytes = s.as_bytes();
                let mut len = bytes.len().min(STRING_LEN);
                while !s.is_char_boundary(len) {
                    len -= 1;
                }
                out[..4].copy_from_slice(&(len as u32).to_be_bytes());
                out[4..4 + len].copy_from_slice(&bytes[..len]);
                out[4 + len..].fill(0);
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for Field {
    fn from(v: i32) -> Self {
        Field::Int(v)
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::String(s.to_string())
    }
}
