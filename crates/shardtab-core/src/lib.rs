#![forbid(unsafe_code)]
//! shardtab-core: pure data types shared by every other crate.
//!
//! - `schema`: logical `DataType`/`Field`/`Schema`.
//! - `types`: closed-variant column storage with validity masks.
//! - `partition`: the local, single-process shard of a table plus row views.
//! - `config`: context configuration (env + defaults).
//!
//! Nothing in here talks to other processes or touches the filesystem.

pub mod config;
pub mod error;
pub mod id;
pub mod partition;
pub mod prelude;
pub mod schema;
pub mod types;

pub use error::{Error, Result};
