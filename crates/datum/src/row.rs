use std::io::{self, Read, Write};

use crate::error::{DatumError, Result};
use crate::value::{ColumnType, Value};

/// Column type sequence shared by every row of a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schema(Vec<ColumnType>);

impl Schema {
    /// Returns the shape of `row`.
    pub fn of(row: &Row) -> Self {
        Schema(row.values.iter().map(Value::column_type).collect())
    }

    pub fn columns(&self) -> &[ColumnType] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Verifies that `row` has exactly this column type sequence.
    ///
    /// # Errors
    ///
    /// Returns [`DatumError::SchemaMismatch`] on any difference in length or
    /// column type.
    pub fn check(&self, row: &Row) -> Result<()> {
        let matches = self.0.len() == row.values.len()
            && self
                .0
                .iter()
                .zip(&row.values)
                .all(|(ty, v)| *ty == v.column_type());
        if matches {
            Ok(())
        } else {
            Err(DatumError::SchemaMismatch {
                expected: self.0.clone(),
                found: Schema::of(row).0,
            })
        }
    }
}

impl From<Vec<ColumnType>> for Schema {
    fn from(columns: Vec<ColumnType>) -> Self {
        Schema(columns)
    }
}

/// An ordered, non-empty sequence of values. Column 0 is the primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Builds a row from its column values.
    ///
    /// # Errors
    ///
    /// Returns [`DatumError::EmptyRow`] if `values` is empty.
    pub fn new(values: Vec<Value>) -> Result<Self> {
        if values.is_empty() {
            return Err(DatumError::EmptyRow);
        }
        Ok(Self { values })
    }

    pub fn primary_key(&self) -> &Value {
        &self.values[0]
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, column: usize) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`; kept for symmetry with [`len`](Row::len).
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn shape(&self) -> Schema {
        Schema::of(self)
    }

    pub fn encoded_len(&self) -> usize {
        self.values.iter().map(Value::encoded_len).sum()
    }

    /// Concatenated column encodings, in column order.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        // writes into a Vec cannot fail
        let _ = self.encode_into(&mut buf);
        buf
    }

    pub fn encode_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for value in &self.values {
            value.encode_into(w)?;
        }
        Ok(())
    }

    /// Reads one row laid out according to `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`DatumError::EmptyRow`] for an empty schema, or any error
    /// from [`Value::decode`].
    pub fn decode<R: Read>(r: &mut R, schema: &Schema) -> Result<Self> {
        let values = schema
            .columns()
            .iter()
            .map(|ty| Value::decode(r, *ty))
            .collect::<Result<Vec<_>>>()?;
        Row::new(values)
    }
}
