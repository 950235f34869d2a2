use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use datum::{Row, Schema, Value};
use tracing::debug;

use crate::error::{Result, TableError};
use crate::format::{
    eof_as_truncated, read_header, read_index_record, read_schema, schema_pos, HEADER_BYTES,
};
use crate::table::{IndexEntry, KeyHasher, PayloadHasher, Table};

/// Reads a table written by [`TableWriter`](crate::TableWriter).
///
/// On open the header, the whole index and the schema are loaded into
/// memory and validated. Rows are decoded on demand: each lookup is one
/// seek to the stored offset plus one sequential read.
pub struct TableReader<R> {
    inner: R,
    /// Stream position the table starts at; stored offsets are relative to it.
    base: u64,
    schema: Option<Schema>,
    index: Vec<IndexEntry>,
}

impl TableReader<BufReader<File>> {
    /// Opens a table file.
    ///
    /// # Errors
    ///
    /// See [`from_reader`](TableReader::from_reader).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> TableReader<R> {
    /// Loads the index and schema of the table starting at the current
    /// position of `inner`.
    ///
    /// A zero-length table (what writing an empty table produces) opens as
    /// an empty reader with no schema.
    ///
    /// # Validation
    ///
    /// - The header, index and schema must fit in the input.
    /// - Every type tag must be known and the schema must be non-empty.
    /// - Every row offset must point into the data section.
    pub fn from_reader(mut inner: R) -> Result<Self> {
        let base = inner.stream_position()?;
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(base))?;
        let available = end.saturating_sub(base);

        if available == 0 {
            debug!("opened empty table");
            return Ok(Self {
                inner,
                base,
                schema: None,
                index: Vec::new(),
            });
        }
        if available < HEADER_BYTES {
            return Err(TableError::Truncated {
                needed: HEADER_BYTES,
                actual: available,
            });
        }

        let row_count = read_header(&mut inner)?;
        let index_end = schema_pos(row_count);
        if index_end > available {
            return Err(TableError::Truncated {
                needed: index_end,
                actual: available,
            });
        }

        // bounded by the check above, so the allocation is at most the input size
        let mut records = Vec::with_capacity(row_count as usize);
        for _ in 0..row_count {
            records.push(read_index_record(&mut inner)?);
        }

        let schema = read_schema(&mut inner).map_err(|e| match e {
            TableError::Io(io) => eof_as_truncated(io, index_end + 8, available),
            other => other,
        })?;
        let data_start = inner.stream_position()? - base;

        let index = records
            .into_iter()
            .enumerate()
            .map(|(position, (hash, offset))| {
                if offset < data_start || offset >= available {
                    Err(TableError::InvalidOffset { position, offset })
                } else {
                    Ok(IndexEntry {
                        hash,
                        offset: Some(offset),
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            rows = index.len(),
            columns = schema.len(),
            "opened table"
        );

        Ok(Self {
            inner,
            base,
            schema: Some(schema),
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// The index as stored: ascending hash order, offsets filled in.
    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    /// Decodes the row at index `position`.
    ///
    /// # Errors
    ///
    /// [`TableError::RowOutOfRange`] if `position >= len()`, or any decode
    /// error for the row bytes.
    pub fn row_at(&mut self, position: usize) -> Result<Row> {
        let len = self.index.len();
        let offset = self
            .index
            .get(position)
            .and_then(|entry| entry.offset)
            .ok_or(TableError::RowOutOfRange { position, len })?;
        let schema = self.schema.as_ref().ok_or(TableError::EmptySchema)?;

        self.inner.seek(SeekFrom::Start(self.base + offset))?;
        Ok(Row::decode(&mut self.inner, schema)?)
    }

    /// Returns every row whose primary key equals `key`, in index order.
    ///
    /// Uses [`PayloadHasher`]; the file must have been written with it.
    pub fn get(&mut self, key: &Value) -> Result<Vec<Row>> {
        self.get_with(key, &PayloadHasher)
    }

    /// Like [`get`](TableReader::get), hashing `key` with `hasher`.
    ///
    /// The index is binary searched for the key's hash. Each row in the run
    /// of equal hashes is then decoded and its primary key compared with
    /// `key`, so colliding keys never leak into the result. A key of a
    /// different type than the primary-key column matches nothing.
    pub fn get_with<H: KeyHasher>(&mut self, key: &Value, hasher: &H) -> Result<Vec<Row>> {
        let hash = hasher.hash_key(key);
        let start = self.index.partition_point(|entry| entry.hash < hash);

        let mut found = Vec::new();
        for position in start..self.index.len() {
            if self.index[position].hash != hash {
                break;
            }
            let row = self.row_at(position)?;
            if matches!(row.primary_key().compare(key), Ok(Ordering::Equal)) {
                found.push(row);
            }
        }
        Ok(found)
    }

    /// Decodes every row, in index order.
    pub fn rows(&mut self) -> Result<Vec<Row>> {
        (0..self.index.len()).map(|position| self.row_at(position)).collect()
    }

    /// Decodes the whole table, keeping the stored order and hashes.
    pub fn into_table(mut self) -> Result<Table> {
        let rows = self.rows()?;
        Ok(Table::from_parts(self.schema, rows, self.index))
    }
}

/// Decodes a whole table from `r`, starting at its current position.
pub fn decode<R: Read + Seek>(r: R) -> Result<Table> {
    TableReader::from_reader(r)?.into_table()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{offset_field_pos, INDEX_RECORD_BYTES};
    use crate::TableState;
    use datum::ColumnType;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn row(key: &str, n: f64) -> Row {
        Row::new(vec![Value::from(key), Value::from(n), Value::from(format!("{key}-{n}"))]).unwrap()
    }

    fn written(rows: Vec<Row>) -> Vec<u8> {
        let mut table = Table::new(rows).unwrap();
        let mut cur = Cursor::new(Vec::new());
        table.serialize(&mut cur).unwrap();
        cur.into_inner()
    }

    // -------------------- Open & decode --------------------

    #[test]
    fn open_reads_index_and_schema() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("table.bin");
        let mut table = Table::new(vec![row("a", 1.0), row("b", 2.0), row("c", 3.0)])?;
        table.write_to_path(&path, &Default::default())?;

        let reader = TableReader::open(&path)?;
        assert_eq!(reader.len(), 3);
        assert!(!reader.is_empty());
        assert_eq!(reader.index(), table.index());
        use ColumnType::*;
        assert_eq!(reader.schema().map(Schema::columns), Some(&[Text, Number, Text][..]));
        Ok(())
    }

    #[test]
    fn row_at_follows_stored_offsets() -> anyhow::Result<()> {
        let mut table = Table::new(vec![row("x", 1.0), row("y", 2.0), row("z", 3.0)])?;
        let mut cur = Cursor::new(Vec::new());
        table.serialize(&mut cur)?;
        cur.set_position(0);

        let mut reader = TableReader::from_reader(cur)?;
        for position in (0..3).rev() {
            assert_eq!(&reader.row_at(position)?, &table.rows()[position]);
        }
        assert!(matches!(
            reader.row_at(3),
            Err(TableError::RowOutOfRange { position: 3, len: 3 })
        ));
        Ok(())
    }

    #[test]
    fn decode_reproduces_table() -> anyhow::Result<()> {
        let rows: Vec<Row> = (0..20).map(|i| row(&format!("k{i}"), i as f64)).collect();
        let mut table = Table::new(rows)?;
        let mut cur = Cursor::new(Vec::new());
        table.serialize(&mut cur)?;
        cur.set_position(0);

        let decoded = decode(cur)?;
        assert_eq!(decoded.rows(), table.rows());
        assert_eq!(decoded.index(), table.index());
        assert_eq!(decoded.schema(), table.schema());
        assert_eq!(decoded.state(), TableState::Serialized);
        Ok(())
    }

    #[test]
    fn decode_empty_input_is_empty_table() -> anyhow::Result<()> {
        let table = decode(Cursor::new(Vec::new()))?;
        assert!(table.is_empty());
        assert!(table.schema().is_none());
        Ok(())
    }

    // -------------------- Lookup --------------------

    #[test]
    fn get_finds_key() -> anyhow::Result<()> {
        let bytes = written(vec![row("a", 1.0), row("b", 2.0), row("c", 3.0)]);
        let mut reader = TableReader::from_reader(Cursor::new(bytes))?;

        assert_eq!(reader.get(&Value::from("b"))?, vec![row("b", 2.0)]);
        assert!(reader.get(&Value::from("nope"))?.is_empty());
        // wrong key type matches nothing
        assert!(reader.get(&Value::from(1.0))?.is_empty());
        Ok(())
    }

    #[test]
    fn get_returns_all_duplicates() -> anyhow::Result<()> {
        let bytes = written(vec![row("k", 1.0), row("j", 0.0), row("k", 2.0)]);
        let mut reader = TableReader::from_reader(Cursor::new(bytes))?;
        assert_eq!(reader.get(&Value::from("k"))?, vec![row("k", 1.0), row("k", 2.0)]);
        Ok(())
    }

    #[test]
    fn get_with_verifies_colliding_keys() -> anyhow::Result<()> {
        let constant = |_: &Value| 42u64;
        let mut table = Table::with_hasher(vec![row("a", 1.0), row("b", 2.0), row("c", 3.0)], &constant)?;
        let mut cur = Cursor::new(Vec::new());
        table.serialize(&mut cur)?;
        cur.set_position(0);

        let mut reader = TableReader::from_reader(cur)?;
        assert_eq!(reader.get_with(&Value::from("c"), &constant)?, vec![row("c", 3.0)]);
        assert!(reader.get_with(&Value::from("d"), &constant)?.is_empty());
        Ok(())
    }

    // -------------------- Validation errors --------------------

    #[test]
    fn open_too_small() {
        let err = TableReader::from_reader(Cursor::new(vec![1u8, 2, 3])).err().unwrap();
        assert!(matches!(err, TableError::Truncated { needed: 8, actual: 3 }));
    }

    #[test]
    fn open_row_count_past_end() {
        let bytes = u64::MAX.to_le_bytes().to_vec();
        let err = TableReader::from_reader(Cursor::new(bytes)).err().unwrap();
        assert!(matches!(err, TableError::Truncated { .. }));
    }

    #[test]
    fn open_truncated_schema() {
        let mut bytes = written(vec![row("a", 1.0)]);
        let schema_start = (8 + INDEX_RECORD_BYTES) as usize;
        bytes.truncate(schema_start + 9);
        let err = TableReader::from_reader(Cursor::new(bytes)).err().unwrap();
        assert!(matches!(err, TableError::Truncated { .. }));
    }

    #[test]
    fn open_rejects_unknown_tag() {
        let mut bytes = written(vec![row("a", 1.0)]);
        let first_tag = (8 + INDEX_RECORD_BYTES + 8) as usize;
        bytes[first_tag] = 9;
        let err = TableReader::from_reader(Cursor::new(bytes)).err().unwrap();
        assert!(matches!(err, TableError::UnknownColumnType(9)));
    }

    #[test]
    fn open_rejects_placeholder_offset() {
        let mut bytes = written(vec![row("a", 1.0), row("b", 2.0)]);
        let field = offset_field_pos(1) as usize;
        bytes[field..field + 8].copy_from_slice(&0u64.to_le_bytes());
        let err = TableReader::from_reader(Cursor::new(bytes)).err().unwrap();
        assert!(matches!(
            err,
            TableError::InvalidOffset {
                position: 1,
                offset: 0
            }
        ));
    }

    #[test]
    fn open_nonexistent_file() {
        let dir = tempdir().unwrap();
        let result = TableReader::open(dir.path().join("missing.bin"));
        assert!(matches!(result, Err(TableError::Io(_))));
    }
}
