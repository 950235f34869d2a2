//! Table file layout constants and section read/write helpers.
//!
//! All positions returned here are relative to the start of the table, which
//! is the stream position the writer started at (0 for a fresh file).
//!
//! ```text
//! [row_count: u64 LE]
//! [hash: u64 LE][offset: u64 LE] x row_count
//! [column_count: u64 LE][tag: u8] x column_count
//! [row data ...]
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use datum::{ColumnType, Schema};
use std::io::{self, Read, Result as IoResult, Write};

use crate::error::{Result, TableError};

/// Size of the row-count header.
pub const HEADER_BYTES: u64 = 8;

/// Size of one index record: 8 (`hash`) + 8 (`offset`).
pub const INDEX_RECORD_BYTES: u64 = 8 + 8;

/// Offset of the `offset` field within an index record.
const OFFSET_FIELD: u64 = 8;

/// Value stored in an index record before its row has been written.
pub const OFFSET_PLACEHOLDER: u64 = 0;

/// Returns where the index record for `position` starts.
pub fn index_record_pos(position: usize) -> u64 {
    HEADER_BYTES + position as u64 * INDEX_RECORD_BYTES
}

/// Returns where the `offset` field of the index record for `position`
/// starts. The writer seeks here to patch in the real row offset.
pub fn offset_field_pos(position: usize) -> u64 {
    index_record_pos(position) + OFFSET_FIELD
}

/// Returns where the schema section starts for a table of `row_count` rows.
///
/// Saturates rather than overflowing on a corrupt row count, so the caller's
/// bounds check fails cleanly.
pub fn schema_pos(row_count: u64) -> u64 {
    row_count
        .saturating_mul(INDEX_RECORD_BYTES)
        .saturating_add(HEADER_BYTES)
}

pub fn write_header<W: Write>(w: &mut W, row_count: u64) -> IoResult<()> {
    w.write_u64::<LittleEndian>(row_count)
}

pub fn read_header<R: Read>(r: &mut R) -> IoResult<u64> {
    r.read_u64::<LittleEndian>()
}

pub fn write_index_record<W: Write>(w: &mut W, hash: u64, offset: u64) -> IoResult<()> {
    w.write_u64::<LittleEndian>(hash)?;
    w.write_u64::<LittleEndian>(offset)?;
    Ok(())
}

/// Reads one index record, returning `(hash, offset)`.
pub fn read_index_record<R: Read>(r: &mut R) -> IoResult<(u64, u64)> {
    let hash = r.read_u64::<LittleEndian>()?;
    let offset = r.read_u64::<LittleEndian>()?;
    Ok((hash, offset))
}

pub fn write_schema<W: Write>(w: &mut W, schema: &Schema) -> IoResult<()> {
    w.write_u64::<LittleEndian>(schema.len() as u64)?;
    for ty in schema.columns() {
        w.write_u8(ty.tag())?;
    }
    Ok(())
}

/// Reads the column count and the type tags that follow it.
///
/// # Errors
///
/// [`TableError::EmptySchema`] for a zero column count,
/// [`TableError::Truncated`] if fewer tags than announced are present, and
/// [`TableError::UnknownColumnType`] for a tag outside `{0, 1}`.
pub fn read_schema<R: Read>(r: &mut R) -> Result<Schema> {
    let count = r.read_u64::<LittleEndian>()?;
    if count == 0 {
        return Err(TableError::EmptySchema);
    }

    let mut tags = Vec::new();
    r.take(count).read_to_end(&mut tags)?;
    if (tags.len() as u64) < count {
        return Err(TableError::Truncated {
            needed: count,
            actual: tags.len() as u64,
        });
    }

    let columns = tags
        .into_iter()
        .map(|tag| ColumnType::from_tag(tag).ok_or(TableError::UnknownColumnType(tag)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Schema::from(columns))
}

/// Maps an unexpected EOF to [`TableError::Truncated`]; other errors pass
/// through unchanged.
pub(crate) fn eof_as_truncated(err: io::Error, needed: u64, actual: u64) -> TableError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        TableError::Truncated { needed, actual }
    } else {
        TableError::Io(err)
    }
}
