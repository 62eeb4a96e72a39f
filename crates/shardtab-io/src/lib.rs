#![forbid(unsafe_code)]
//! shardtab-io: ingestion and output collaborators.
//!
//! - `source`: the `TableSource` contract and row-range shard assignment.
//! - `readers`: CSV ingestion (one shard per rank, schema inferred from the
//!   whole file so every rank agrees on it).
//! - `writers`: human-readable and CSV rendering of a lazy row sequence.

pub mod error;
pub mod readers;
pub mod source;
pub mod writers;

pub use error::{Error, Result};
pub use readers::csv::{CsvReadOptions, CsvSource};
pub use source::{check_shard, shard_range, MemorySource, TableSource};
pub use writers::csv::CsvWriter;
pub use writers::pretty::PrettyWriter;
