//! The ingestion contract: a source hands each rank its shard as a Partition.

use std::ops::Range;

use shardtab_core::id::Rank;
use shardtab_core::partition::Partition;
use shardtab_core::schema::Schema;

use crate::error::{Error, Result};

/// External ingestion collaborator.
///
/// Shard assignment is the source's responsibility; the table layer only
/// passes the caller's `rank` and the group's `world_size`.
pub trait TableSource {
    /// Locator used in logs and error messages (path, URI, ...).
    fn describe(&self) -> String;

    /// Schema declared ahead of ingestion, if the source knows one.
    /// `None` means the schema is inferred while loading.
    fn schema(&self) -> Option<Schema> {
        None
    }

    /// Materialize the shard owned by `rank`. The returned partition carries
    /// the full table schema even when the shard has no rows.
    fn load_shard(&self, rank: Rank, world_size: usize) -> Result<Partition>;
}

/// Contiguous row range owned by `rank` when `len` rows are split across
/// `world_size` processes. Ranges tile `0..len` in rank order and differ in
/// size by at most one row.
pub fn shard_range(len: usize, rank: usize, world_size: usize) -> Range<usize> {
    if world_size == 0 {
        return 0..0;
    }
    let start = len * rank / world_size;
    let end = len * (rank + 1) / world_size;
    start..end
}

/// Reject a `(rank, world_size)` pair that names no shard.
pub fn check_shard(rank: usize, world_size: usize) -> Result<()> {
    if rank >= world_size {
        return Err(Error::InvalidShard { rank, world_size });
    }
    Ok(())
}

/// In-memory source: shards an existing partition with `shard_range`.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    partition: Partition,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, partition: Partition) -> Self {
        Self {
            name: name.into(),
            partition,
        }
    }
}

impl TableSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory://{}", self.name)
    }

    fn schema(&self) -> Option<Schema> {
        Some(self.partition.schema())
    }

    fn load_shard(&self, rank: Rank, world_size: usize) -> Result<Partition> {
        check_shard(rank.get(), world_size)?;
        let range = shard_range(self.partition.num_rows(), rank.get(), world_size);
        let indices: Vec<usize> = range.collect();
        Ok(self.partition.take(&indices)?)
    }
}
