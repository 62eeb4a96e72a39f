//! `Partition`: the local, single-process slice of a distributed table.
//!
//! A partition is an ordered list of columns sharing one row count. Row and
//! column counts never change after `build`; operators produce new partitions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{DataType, Schema};
use crate::types::{Column, ColumnBuilder, Scalar, ValueRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Partition {
    /// Validate and assemble columns into a partition.
    ///
    /// All columns must share the same length and have distinct names.
    pub fn build(columns: Vec<Column>) -> Result<Self> {
        let num_rows = columns.first().map(|c| c.len()).unwrap_or(0);
        validate_columns(&columns, num_rows)?;
        Ok(Self { columns, num_rows })
    }

    /// Zero-row partition with the given schema.
    pub fn empty(schema: &Schema) -> Self {
        let columns = schema
            .fields
            .iter()
            .map(|f| ColumnBuilder::new(f.clone()).finish())
            .collect();
        Self {
            columns,
            num_rows: 0,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn schema(&self) -> Schema {
        Schema::new(self.columns.iter().map(|c| c.field().clone()).collect())
    }

    /// Read-only view of all column values at logical index `idx`.
    pub fn row(&self, idx: usize) -> Result<Row<'_>> {
        if idx >= self.num_rows {
            return Err(Error::IndexOutOfBounds {
                index: idx,
                len: self.num_rows,
            });
        }
        Ok(Row {
            partition: self,
            index: idx,
        })
    }

    /// Lazy iterator over rows in partition order. Call again to restart.
    pub fn rows(&self) -> Rows<'_> {
        Rows {
            partition: self,
            next: 0,
        }
    }

    /// Gather rows (in the given order) into a new partition.
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.num_rows) {
            return Err(Error::IndexOutOfBounds {
                index: bad,
                len: self.num_rows,
            });
        }
        Ok(Self {
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            num_rows: indices.len(),
        })
    }
}

fn validate_columns(columns: &[Column], num_rows: usize) -> Result<()> {
    let mut seen = HashSet::with_capacity(columns.len());
    for col in columns {
        if col.len() != num_rows {
            return Err(Error::SchemaMismatch(format!(
                "column '{}' has {} rows, expected {}",
                col.name(),
                col.len(),
                num_rows
            )));
        }
        if !seen.insert(col.name()) {
            return Err(Error::SchemaMismatch(format!(
                "duplicate column name '{}'",
                col.name()
            )));
        }
    }
    Ok(())
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    partition: &'a Partition,
    index: usize,
}

macro_rules! typed_getter {
    ($fn_name:ident, $ty:ty, $variant:ident, $data_type:expr) => {
        /// Typed access; `Ok(None)` for a null cell.
        pub fn $fn_name(&self, col: usize) -> Result<Option<$ty>> {
            match self.get(col)? {
                ValueRef::Null => Ok(None),
                ValueRef::$variant(v) => Ok(Some(v)),
                other => Err(self.type_mismatch(col, $data_type, other)),
            }
        }
    };
}

impl<'a> Row<'a> {
    /// Logical row index within the partition.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn num_columns(&self) -> usize {
        self.partition.num_columns()
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.partition
            .columns
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub fn get(&self, col: usize) -> Result<ValueRef<'a>> {
        let column = self
            .partition
            .columns
            .get(col)
            .ok_or(Error::ColumnIndexOutOfRange {
                index: col,
                num_columns: self.partition.num_columns(),
            })?;
        // Row construction already checked the row index.
        Ok(column.value(self.index).unwrap_or(ValueRef::Null))
    }

    pub fn get_by_name(&self, name: &str) -> Result<ValueRef<'a>> {
        self.get(self.index_of(name)?)
    }

    typed_getter!(get_bool, bool, Bool, DataType::Boolean);
    typed_getter!(get_i32, i32, I32, DataType::Int32);
    typed_getter!(get_i64, i64, I64, DataType::Int64);
    typed_getter!(get_f32, f32, F32, DataType::Float32);
    typed_getter!(get_f64, f64, F64, DataType::Float64);
    typed_getter!(get_str, &'a str, Str, DataType::Utf8);

    pub fn to_scalars(&self) -> Vec<Scalar> {
        self.partition
            .columns
            .iter()
            .map(|c| c.value(self.index).unwrap_or(ValueRef::Null).to_scalar())
            .collect()
    }

    fn type_mismatch(&self, col: usize, expected: DataType, found: ValueRef<'_>) -> Error {
        let column = &self.partition.columns[col];
        Error::TypeMismatch {
            column: column.name().to_string(),
            expected,
            found: found.data_type().unwrap_or(column.data_type()),
        }
    }
}

/// Iterator returned by `Partition::rows`.
#[derive(Debug, Clone)]
pub struct Rows<'a> {
    partition: &'a Partition,
    next: usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.partition.num_rows {
            return None;
        }
        let row = Row {
            partition: self.partition,
            index: self.next,
        };
        self.next += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.partition.num_rows - self.next;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for Rows<'_> {}
