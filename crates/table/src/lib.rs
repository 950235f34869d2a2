//! # Table
//!
//! Write-once, single-file storage for a set of typed rows.
//!
//! A [`Table`] takes rows in any order, sorts them by the hash of their
//! primary key and serializes them behind a fixed-width index, so any row
//! can be reached with one seek. [`TableReader`] loads the index back and
//! decodes rows on demand.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ HEADER                                        │
//! │ row_count (u64)                               │
//! ├───────────────────────────────────────────────┤
//! │ INDEX (16 bytes per row, ascending hash)      │
//! │                                               │
//! │ hash (u64) | row_offset (u64)                 │
//! ├───────────────────────────────────────────────┤
//! │ SCHEMA                                        │
//! │                                               │
//! │ column_count (u64) | type tag (u8) per column │
//! ├───────────────────────────────────────────────┤
//! │ DATA (rows in index order)                    │
//! │                                               │
//! │ Text: len (u64) | bytes    Number: f64 bits   │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. Row offsets are written as a placeholder
//! first and patched in as each row is appended.
//!
//! ## Limitations
//!
//! The index holds hashes only, with no probing: lookups verify the key
//! against every row in a run of equal hashes. Hashes come from
//! [`Value::hash64`](datum::Value::hash64) and are not guaranteed to be
//! stable across Rust releases. There is no checksum. A single writer must
//! own the target for the duration of a write.

mod error;
pub mod format;
mod reader;
mod table;
mod writer;

pub use error::{Result, TableError};
pub use reader::{decode, TableReader};
pub use table::{IndexEntry, KeyHasher, PayloadHasher, Table, TableState};
pub use writer::{TableWriter, WriteOptions, WriteOutcome};
