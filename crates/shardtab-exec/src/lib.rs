#![forbid(unsafe_code)]
//! shardtab-exec: the distributed context and the partitioned table.
//!
//! A `DistributedContext` owns this process's group membership. Tables borrow
//! the context, so they cannot outlive it and the context cannot be finalized
//! while any of them is alive.

pub mod context;
pub mod error;
pub mod metrics;
pub mod table;

pub use context::{DistributedContext, LifecycleState};
pub use error::{ExecError, Result};
pub use table::DistributedTable;
