use std::io;

use thiserror::Error;

use crate::ColumnType;

#[derive(Debug, Error)]
pub enum DatumError {
    #[error("row has no columns")]
    EmptyRow,
    #[error("cannot compare {left} with {right}")]
    TypeMismatch { left: ColumnType, right: ColumnType },
    #[error("row shape {found:?} does not match schema {expected:?}")]
    SchemaMismatch {
        expected: Vec<ColumnType>,
        found: Vec<ColumnType>,
    },
    #[error("text column is not valid utf-8")]
    InvalidUtf8,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, DatumError>;
