//! Convenient re-exports for downstream crates.

pub use crate::config::ContextConfig;
pub use crate::error::{Error, Result};
pub use crate::id::Rank;
pub use crate::partition::{Partition, Row, Rows};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::types::{Column, ColumnBuilder, ColumnData, Scalar, ValueRef};
