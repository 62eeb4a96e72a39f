#![forbid(unsafe_code)]
//! shardtab-operators: partition-local operators.
//!
//! Design intent:
//! - Operators are pure and synchronous: a Partition in, a new Partition out.
//! - Nothing in here touches the process group. Selection is embarrassingly
//!   parallel, so each process runs it on its own shard without coordination.

pub mod compare;
pub mod select;
pub mod traits;

pub use compare::{ColumnRef, CompareOp, ComparePredicate};
pub use select::select;
pub use traits::{from_fn, OpError, RowPredicate};
