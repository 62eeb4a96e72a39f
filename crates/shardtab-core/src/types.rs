//! Column storage: a closed set of typed vectors plus a validity mask.
//!
//! Each `ColumnData` variant fixes its in-memory representation. Null slots
//! hold the type's default value and are masked out by `Column::validity`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{DataType, Field};

/// Owned single value, used when building columns and in tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
}

impl Scalar {
    /// `None` for `Null`, which fits any nullable column.
    pub fn data_type(&self) -> Option<DataType> {
        self.as_value_ref().data_type()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_value_ref(&self) -> ValueRef<'_> {
        match self {
            Scalar::Null => ValueRef::Null,
            Scalar::Bool(b) => ValueRef::Bool(*b),
            Scalar::I32(i) => ValueRef::I32(*i),
            Scalar::I64(i) => ValueRef::I64(*i),
            Scalar::F32(f) => ValueRef::F32(*f),
            Scalar::F64(f) => ValueRef::F64(*f),
            Scalar::Str(s) => ValueRef::Str(s),
        }
    }
}

/// Borrowed view of one cell. Returned by row accessors so predicates never
/// clone strings on the hot path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(&'a str),
}

impl<'a> ValueRef<'a> {
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            ValueRef::Null => None,
            ValueRef::Bool(_) => Some(DataType::Boolean),
            ValueRef::I32(_) => Some(DataType::Int32),
            ValueRef::I64(_) => Some(DataType::Int64),
            ValueRef::F32(_) => Some(DataType::Float32),
            ValueRef::F64(_) => Some(DataType::Float64),
            ValueRef::Str(_) => Some(DataType::Utf8),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ValueRef::Null)
    }

    pub fn to_scalar(&self) -> Scalar {
        match *self {
            ValueRef::Null => Scalar::Null,
            ValueRef::Bool(b) => Scalar::Bool(b),
            ValueRef::I32(i) => Scalar::I32(i),
            ValueRef::I64(i) => Scalar::I64(i),
            ValueRef::F32(f) => Scalar::F32(f),
            ValueRef::F64(f) => Scalar::F64(f),
            ValueRef::Str(s) => Scalar::Str(s.to_string()),
        }
    }
}

impl fmt::Display for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRef::Null => f.write_str("null"),
            ValueRef::Bool(b) => write!(f, "{b}"),
            ValueRef::I32(i) => write!(f, "{i}"),
            ValueRef::I64(i) => write!(f, "{i}"),
            ValueRef::F32(v) => write!(f, "{v}"),
            ValueRef::F64(v) => write!(f, "{v}"),
            ValueRef::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Boolean(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Utf8(Vec<String>),
}

impl ColumnData {
    pub fn with_capacity(data_type: DataType, capacity: usize) -> Self {
        match data_type {
            DataType::Boolean => ColumnData::Boolean(Vec::with_capacity(capacity)),
            DataType::Int32 => ColumnData::Int32(Vec::with_capacity(capacity)),
            DataType::Int64 => ColumnData::Int64(Vec::with_capacity(capacity)),
            DataType::Float32 => ColumnData::Float32(Vec::with_capacity(capacity)),
            DataType::Float64 => ColumnData::Float64(Vec::with_capacity(capacity)),
            DataType::Utf8 => ColumnData::Utf8(Vec::with_capacity(capacity)),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ColumnData::Boolean(_) => DataType::Boolean,
            ColumnData::Int32(_) => DataType::Int32,
            ColumnData::Int64(_) => DataType::Int64,
            ColumnData::Float32(_) => DataType::Float32,
            ColumnData::Float64(_) => DataType::Float64,
            ColumnData::Utf8(_) => DataType::Utf8,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Boolean(v) => v.len(),
            ColumnData::Int32(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::Float32(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw slot value, ignoring validity. Caller checks bounds.
    fn slot(&self, idx: usize) -> ValueRef<'_> {
        match self {
            ColumnData::Boolean(v) => ValueRef::Bool(v[idx]),
            ColumnData::Int32(v) => ValueRef::I32(v[idx]),
            ColumnData::Int64(v) => ValueRef::I64(v[idx]),
            ColumnData::Float32(v) => ValueRef::F32(v[idx]),
            ColumnData::Float64(v) => ValueRef::F64(v[idx]),
            ColumnData::Utf8(v) => ValueRef::Str(&v[idx]),
        }
    }

    fn push_default(&mut self) {
        match self {
            ColumnData::Boolean(v) => v.push(false),
            ColumnData::Int32(v) => v.push(0),
            ColumnData::Int64(v) => v.push(0),
            ColumnData::Float32(v) => v.push(0.0),
            ColumnData::Float64(v) => v.push(0.0),
            ColumnData::Utf8(v) => v.push(String::new()),
        }
    }

    /// Returns false if `value` does not match this column's type.
    fn try_push(&mut self, value: ValueRef<'_>) -> bool {
        match (self, value) {
            (ColumnData::Boolean(v), ValueRef::Bool(b)) => v.push(b),
            (ColumnData::Int32(v), ValueRef::I32(i)) => v.push(i),
            (ColumnData::Int64(v), ValueRef::I64(i)) => v.push(i),
            (ColumnData::Float32(v), ValueRef::F32(f)) => v.push(f),
            (ColumnData::Float64(v), ValueRef::F64(f)) => v.push(f),
            (ColumnData::Utf8(v), ValueRef::Str(s)) => v.push(s.to_string()),
            _ => return false,
        }
        true
    }

    fn gather(&self, indices: &[usize]) -> ColumnData {
        fn pick<T: Clone>(v: &[T], indices: &[usize]) -> Vec<T> {
            indices.iter().map(|&i| v[i].clone()).collect()
        }
        match self {
            ColumnData::Boolean(v) => ColumnData::Boolean(pick(v, indices)),
            ColumnData::Int32(v) => ColumnData::Int32(pick(v, indices)),
            ColumnData::Int64(v) => ColumnData::Int64(pick(v, indices)),
            ColumnData::Float32(v) => ColumnData::Float32(pick(v, indices)),
            ColumnData::Float64(v) => ColumnData::Float64(pick(v, indices)),
            ColumnData::Utf8(v) => ColumnData::Utf8(pick(v, indices)),
        }
    }
}

/// A named, typed, fixed-length sequence of values with a validity mask.
///
/// Columns are only produced by `ColumnBuilder::finish` (or `take`) and are
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    field: Field,
    data: ColumnData,
    validity: Vec<bool>,
}

impl Column {
    /// Build a column from owned scalars. Fails on type or nullability violations.
    pub fn from_scalars(field: Field, values: &[Scalar]) -> Result<Self> {
        let mut builder = ColumnBuilder::with_capacity(field, values.len());
        for v in values {
            builder.push(v.as_value_ref())?;
        }
        Ok(builder.finish())
    }

    /// Non-nullable column from a plain vector; every slot is valid.
    fn dense(name: impl Into<String>, data: ColumnData) -> Self {
        let len = data.len();
        Self {
            field: Field::new(name, data.data_type(), false),
            data,
            validity: vec![true; len],
        }
    }

    pub fn from_bools(name: impl Into<String>, values: Vec<bool>) -> Self {
        Self::dense(name, ColumnData::Boolean(values))
    }

    pub fn from_i32s(name: impl Into<String>, values: Vec<i32>) -> Self {
        Self::dense(name, ColumnData::Int32(values))
    }

    pub fn from_i64s(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self::dense(name, ColumnData::Int64(values))
    }

    pub fn from_f32s(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self::dense(name, ColumnData::Float32(values))
    }

    pub fn from_f64s(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::dense(name, ColumnData::Float64(values))
    }

    pub fn from_strs<S: Into<String>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Self::dense(
            name,
            ColumnData::Utf8(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn data_type(&self) -> DataType {
        self.field.data_type
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_valid(&self, idx: usize) -> bool {
        self.validity.get(idx).copied().unwrap_or(false)
    }

    pub fn null_count(&self) -> usize {
        self.validity.iter().filter(|v| !**v).count()
    }

    /// Value at `idx`, `None` when out of range.
    pub fn value(&self, idx: usize) -> Option<ValueRef<'_>> {
        if idx >= self.len() {
            return None;
        }
        if !self.validity[idx] {
            return Some(ValueRef::Null);
        }
        Some(self.data.slot(idx))
    }

    /// Gather the given row indices into a new column. Indices must be in range.
    pub fn take(&self, indices: &[usize]) -> Column {
        Column {
            field: self.field.clone(),
            data: self.data.gather(indices),
            validity: indices.iter().map(|&i| self.validity[i]).collect(),
        }
    }
}

/// Append-only builder; the only way to grow a column.
#[derive(Debug)]
pub struct ColumnBuilder {
    field: Field,
    data: ColumnData,
    validity: Vec<bool>,
}

impl ColumnBuilder {
    pub fn new(field: Field) -> Self {
        Self::with_capacity(field, 0)
    }

    pub fn with_capacity(field: Field, capacity: usize) -> Self {
        Self {
            data: ColumnData::with_capacity(field.data_type, capacity),
            validity: Vec::with_capacity(capacity),
            field,
        }
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn len(&self) -> usize {
        self.validity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validity.is_empty()
    }

    pub fn push(&mut self, value: ValueRef<'_>) -> Result<()> {
        if value.is_null() {
            return self.push_null();
        }
        if !self.data.try_push(value) {
            return Err(Error::TypeMismatch {
                column: self.field.name.clone(),
                expected: self.field.data_type,
                // try_push only rejects non-null values
                found: value.data_type().unwrap_or(self.field.data_type),
            });
        }
        self.validity.push(true);
        Ok(())
    }

    pub fn push_null(&mut self) -> Result<()> {
        if !self.field.nullable {
            return Err(Error::NullViolation(self.field.name.clone()));
        }
        self.data.push_default();
        self.validity.push(false);
        Ok(())
    }

    pub fn finish(self) -> Column {
        Column {
            field: self.field,
            data: self.data,
            validity: self.validity,
        }
    }
}
