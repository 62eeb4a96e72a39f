#![forbid(unsafe_code)]
//! shardtab: a distributed table engine.
//!
//! Each cooperating process owns one shard of a logical table, loads it from a
//! shared source, filters it locally and renders what it kept. This crate
//! re-exports the workspace crates under one roof.

pub use shardtab_comm as comm;
pub use shardtab_core::prelude;
pub use shardtab_exec as exec;
pub use shardtab_operators as operators;

pub use shardtab_core::config::ContextConfig;
pub use shardtab_exec::{DistributedContext, DistributedTable, ExecError, LifecycleState};
pub use shardtab_io::{CsvReadOptions, CsvSource, MemorySource, TableSource};
pub use shardtab_operators::{from_fn, ComparePredicate, RowPredicate};
