use datum::DatumError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Datum(#[from] DatumError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("table truncated (needed {needed} bytes, got {actual})")]
    Truncated { needed: u64, actual: u64 },
    #[error("schema has no columns")]
    EmptySchema,
    #[error("unknown column type tag {0}")]
    UnknownColumnType(u8),
    #[error("row {position} has invalid offset {offset}")]
    InvalidOffset { position: usize, offset: u64 },
    #[error("row position {position} out of range (len {len})")]
    RowOutOfRange { position: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, TableError>;
