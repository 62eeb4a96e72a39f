//! Readers that materialize one process's shard of a source.

pub mod csv;
