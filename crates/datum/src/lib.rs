//! # Datum
//!
//! Typed column values and rows for the table file format.
//!
//! A [`Value`] is either UTF-8 text or a 64-bit float. A [`Row`] is a
//! non-empty sequence of values whose first column is the primary key, and a
//! [`Schema`] is the column type sequence every row of one table must share.
//!
//! ## Encoding
//!
//! ```text
//! Text   : len (u64 LE, byte count) | bytes
//! Number : f64 bit pattern (u64 LE)
//! ```
//!
//! A row is the concatenation of its column encodings. Numbers carry no
//! length prefix; the schema tells the decoder how wide each column is.
//!
//! ## Example
//! ```rust
//! use datum::{Row, Value};
//!
//! let row = Row::new(vec![Value::from(3.0), Value::from("Test1")]).unwrap();
//! assert_eq!(row.primary_key(), &Value::Number(3.0));
//! assert_eq!(row.encode().len(), 8 + 8 + 5);
//! ```

mod error;
mod row;
mod value;

pub use error::{DatumError, Result};
pub use row::{Row, Schema};
pub use value::{ColumnType, Value};
