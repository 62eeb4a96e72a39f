use thiserror::Error;

use crate::schema::DataType;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("row index {index} out of bounds for partition with {len} rows")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("column index {index} out of range ({num_columns} columns)")]
    ColumnIndexOutOfRange { index: usize, num_columns: usize },

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("type mismatch on column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: DataType,
    },

    #[error("null value in non-nullable column '{0}'")]
    NullViolation(String),

    /// Raised by user predicates that fail for reasons other than column access.
    #[error("predicate error: {0}")]
    Predicate(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
