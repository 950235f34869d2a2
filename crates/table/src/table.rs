use std::io::{Seek, Write};
use std::path::Path;

use datum::{Row, Schema, Value};
use tracing::debug;

use crate::error::Result;
use crate::writer::{TableWriter, WriteOptions, WriteOutcome};

/// Maps a primary key to the 64-bit hash the index is ordered by.
pub trait KeyHasher {
    fn hash_key(&self, key: &Value) -> u64;
}

/// Default hasher: [`Value::hash64`] over the key's payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct PayloadHasher;

impl KeyHasher for PayloadHasher {
    fn hash_key(&self, key: &Value) -> u64 {
        key.hash64()
    }
}

impl<F> KeyHasher for F
where
    F: Fn(&Value) -> u64,
{
    fn hash_key(&self, key: &Value) -> u64 {
        self(key)
    }
}

/// One index slot: the primary-key hash and, once the row has been
/// written, its byte offset from the start of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub hash: u64,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// Rows are sorted and hashed; offsets are not known yet.
    Indexed,
    /// Every index entry carries the offset its row was written at.
    Serialized,
}

/// A set of same-shaped rows ordered by primary-key hash.
///
/// The index is built once, on construction. Rows are stably sorted by
/// hash, so rows whose keys hash equal keep their insertion order. Keys are
/// never compared and duplicates are kept.
#[derive(Debug, Clone)]
pub struct Table {
    schema: Option<Schema>,
    rows: Vec<Row>,
    index: Vec<IndexEntry>,
    state: TableState,
}

impl Table {
    /// Builds a table whose schema is the shape of the first row.
    ///
    /// # Errors
    ///
    /// Returns `SchemaMismatch` if any row's shape differs from the first.
    pub fn new(rows: Vec<Row>) -> Result<Self> {
        Self::with_hasher(rows, &PayloadHasher)
    }

    /// Like [`new`](Table::new), ordering rows by `hasher` instead of
    /// [`PayloadHasher`].
    pub fn with_hasher<H: KeyHasher>(rows: Vec<Row>, hasher: &H) -> Result<Self> {
        let schema = rows.first().map(Row::shape);
        Self::build(schema, rows, hasher)
    }

    /// Builds a table against a declared schema. Every row, the first
    /// included, must match it.
    pub fn with_schema(schema: Schema, rows: Vec<Row>) -> Result<Self> {
        Self::build(Some(schema), rows, &PayloadHasher)
    }

    pub fn empty() -> Self {
        Self {
            schema: None,
            rows: Vec::new(),
            index: Vec::new(),
            state: TableState::Indexed,
        }
    }

    fn build<H: KeyHasher>(schema: Option<Schema>, rows: Vec<Row>, hasher: &H) -> Result<Self> {
        if let Some(schema) = &schema {
            for row in &rows {
                schema.check(row)?;
            }
        }

        let mut table = Self {
            schema,
            rows,
            index: Vec::new(),
            state: TableState::Indexed,
        };
        table.build_index(hasher);
        Ok(table)
    }

    fn build_index<H: KeyHasher>(&mut self, hasher: &H) {
        let mut keyed: Vec<(u64, Row)> = std::mem::take(&mut self.rows)
            .into_iter()
            .map(|row| (hasher.hash_key(row.primary_key()), row))
            .collect();
        // stable: equal hashes keep insertion order
        keyed.sort_by_key(|(hash, _)| *hash);

        self.index = keyed
            .iter()
            .map(|(hash, _)| IndexEntry {
                hash: *hash,
                offset: None,
            })
            .collect();
        self.rows = keyed.into_iter().map(|(_, row)| row).collect();
        self.state = TableState::Indexed;

        debug!(rows = self.rows.len(), "built primary-key index");
    }

    /// Reassembles a table read back from disk, keeping the stored order
    /// and hashes.
    pub(crate) fn from_parts(schema: Option<Schema>, rows: Vec<Row>, index: Vec<IndexEntry>) -> Self {
        Self {
            schema,
            rows,
            index,
            state: TableState::Serialized,
        }
    }

    /// Rows in index order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    /// The table's schema, or `None` for a table built from zero rows
    /// without a declared schema.
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    /// Writes the table to `target` starting at its current position.
    ///
    /// See [`TableWriter::write`].
    pub fn serialize<W: Write + Seek>(&mut self, target: &mut W) -> Result<WriteOutcome> {
        TableWriter::write(self, target)
    }

    /// Writes the table to `path` through a temporary file.
    ///
    /// See [`TableWriter::write_to_path`].
    pub fn write_to_path<P: AsRef<Path>>(
        &mut self,
        path: P,
        opts: &WriteOptions,
    ) -> Result<WriteOutcome> {
        TableWriter::write_to_path(self, path.as_ref(), opts)
    }

    pub(crate) fn clear_offsets(&mut self) {
        for entry in &mut self.index {
            entry.offset = None;
        }
        self.state = TableState::Indexed;
    }

    pub(crate) fn mark_serialized(&mut self, offsets: Vec<u64>) {
        for (entry, offset) in self.index.iter_mut().zip(offsets) {
            entry.offset = Some(offset);
        }
        self.state = TableState::Serialized;
    }
}
