use byteorder::{LittleEndian, WriteBytesExt};
use std::ffi::OsString;
use std::fs::{rename, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::error::Result;
use crate::format::{
    offset_field_pos, write_header, write_index_record, write_schema, OFFSET_PLACEHOLDER,
};
use crate::table::Table;

/// Options for [`TableWriter::write_to_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// If `true`, the staged file is fsynced before it is renamed into place.
    pub sync: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { sync: true }
    }
}

/// What a write produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The table had no rows; nothing was written.
    Empty,
    /// `rows` rows were written, taking `bytes` bytes in total.
    Written { rows: usize, bytes: u64 },
}

/// Serializes a [`Table`] into the single-file layout.
///
/// Stateless, like the rest of the write path: all work happens in the two
/// associated functions.
pub struct TableWriter {}

impl TableWriter {
    /// Writes `table` to `w`, starting at the current stream position.
    ///
    /// # Two passes
    ///
    /// The index is written first with every offset set to a placeholder.
    /// Then, for each row in index order, the writer notes the current
    /// position, seeks back to that row's index record to patch the offset
    /// in, seeks forward again and appends the row.
    ///
    /// On success every index entry of `table` holds its row's offset and
    /// the table is [`Serialized`](crate::TableState::Serialized). Writing
    /// an unchanged table again produces identical bytes.
    ///
    /// # Errors
    ///
    /// Any I/O error is returned as soon as it happens. Nothing is rolled
    /// back; the target should be considered garbage and rewritten.
    pub fn write<W: Write + Seek>(table: &mut Table, w: &mut W) -> Result<WriteOutcome> {
        table.clear_offsets();
        let rows = table.rows();
        if rows.is_empty() {
            debug!("table has no rows, nothing written");
            return Ok(WriteOutcome::Empty);
        }
        // every row has been checked against this shape
        let schema = rows[0].shape();

        let base = w.stream_position()?;

        // Pass 1: header, index with placeholder offsets, schema
        write_header(w, rows.len() as u64)?;
        for entry in table.index() {
            write_index_record(w, entry.hash, OFFSET_PLACEHOLDER)?;
        }
        write_schema(w, &schema)?;

        // Pass 2: rows, patching each offset into its index record
        let mut offsets = Vec::with_capacity(rows.len());
        for (position, row) in rows.iter().enumerate() {
            let file_pos = w.stream_position()?;
            let offset = file_pos - base;

            w.seek(SeekFrom::Start(base + offset_field_pos(position)))?;
            w.write_u64::<LittleEndian>(offset)?;
            w.seek(SeekFrom::Start(file_pos))?;

            row.encode_into(w)?;
            trace!(position, offset, "patched row offset");
            offsets.push(offset);
        }

        let bytes = w.stream_position()? - base;
        w.flush()?;

        let count = offsets.len();
        table.mark_serialized(offsets);
        debug!(rows = count, bytes, "table written");

        Ok(WriteOutcome::Written { rows: count, bytes })
    }

    /// Writes `table` to a new file at `path`.
    ///
    /// The table is staged in `<path>.tmp`, flushed, fsynced when
    /// `opts.sync` is set, then renamed over `path`. A crash mid-write
    /// leaves the temp file behind and `path` untouched.
    ///
    /// An empty table returns [`WriteOutcome::Empty`] without creating any
    /// file.
    pub fn write_to_path(table: &mut Table, path: &Path, opts: &WriteOptions) -> Result<WriteOutcome> {
        if table.is_empty() {
            table.clear_offsets();
            debug!(path = %path.display(), "table has no rows, no file created");
            return Ok(WriteOutcome::Empty);
        }

        let tmp_path = tmp_path_for(path);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;

        let mut out = BufWriter::new(file);
        let outcome = Self::write(table, &mut out)?;
        let file = out.into_inner().map_err(|e| e.into_error())?;

        if opts.sync {
            file.sync_all()?;
        }
        drop(file);

        rename(&tmp_path, path)?;
        debug!(path = %path.display(), "table file in place");

        Ok(outcome)
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
