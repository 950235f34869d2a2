use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{DatumError, Result};

/// Column type discriminator, stored on disk as one byte per schema column.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum ColumnType {
    Text = 0,
    Number = 1,
}

impl ColumnType {
    /// Returns the on-disk tag byte.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Maps a tag byte back to its column type; unknown bytes yield `None`.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ColumnType::Text),
            1 => Some(ColumnType::Number),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => f.write_str("text"),
            ColumnType::Number => f.write_str("number"),
        }
    }
}

/// A single column value.
///
/// Values are immutable once built and are owned by the [`Row`](crate::Row)
/// that contains them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
}

impl Value {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Text(_) => ColumnType::Text,
            Value::Number(_) => ColumnType::Number,
        }
    }

    /// Orders two values of the same variant.
    ///
    /// Text compares bytewise. Numbers use [`f64::total_cmp`], so NaN sorts
    /// above every other number and `-0.0` sorts below `0.0`.
    ///
    /// # Errors
    ///
    /// Returns [`DatumError::TypeMismatch`] if the variants differ.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => Ok(a.as_bytes().cmp(b.as_bytes())),
            (Value::Number(a), Value::Number(b)) => Ok(a.total_cmp(b)),
            _ => Err(DatumError::TypeMismatch {
                left: self.column_type(),
                right: other.column_type(),
            }),
        }
    }

    /// Hashes the payload: the UTF-8 bytes of a string, or the bit pattern
    /// of a number.
    ///
    /// Stable for the lifetime of a build, but not across Rust releases.
    /// This is an index key, not a content address.
    pub fn hash64(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match self {
            Value::Text(s) => s.as_bytes().hash(&mut hasher),
            Value::Number(n) => n.to_bits().hash(&mut hasher),
        }
        hasher.finish()
    }

    /// Number of bytes [`encode`](Value::encode) produces.
    pub fn encoded_len(&self) -> usize {
        match self {
            Value::Text(s) => 8 + s.len(),
            Value::Number(_) => 8,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        // writes into a Vec cannot fail
        let _ = self.encode_into(&mut buf);
        buf
    }

    /// Writes the canonical encoding of this value to `w`.
    pub fn encode_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Value::Text(s) => {
                w.write_u64::<LittleEndian>(s.len() as u64)?;
                w.write_all(s.as_bytes())?;
            }
            Value::Number(n) => {
                w.write_u64::<LittleEndian>(n.to_bits())?;
            }
        }
        Ok(())
    }

    /// Reads one value of type `ty` from `r`.
    ///
    /// The text length is not trusted for preallocation; a length running
    /// past the end of the input surfaces as an `UnexpectedEof` I/O error.
    pub fn decode<R: Read>(r: &mut R, ty: ColumnType) -> Result<Value> {
        match ty {
            ColumnType::Number => {
                let bits = r.read_u64::<LittleEndian>()?;
                Ok(Value::Number(f64::from_bits(bits)))
            }
            ColumnType::Text => {
                let len = r.read_u64::<LittleEndian>()?;
                let mut bytes = Vec::new();
                r.by_ref().take(len).read_to_end(&mut bytes)?;
                if bytes.len() as u64 != len {
                    return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
                }
                let s = String::from_utf8(bytes).map_err(|_| DatumError::InvalidUtf8)?;
                Ok(Value::Text(s))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}
