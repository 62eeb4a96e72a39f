//! Rendezvous transports: the point-to-point/collective primitive underneath
//! `ProcessGroup`.
//!
//! A transport instance is one process's *endpoint*. It hands out at most one
//! active `Membership` at a time; a second `join` before `leave` fails with
//! `DuplicateJoin`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shardtab_core::id::Rank;

use crate::error::Result;

pub mod fs;
pub mod local;

/// Unique identifier for one join of one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(pub Uuid);

impl MemberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "member-{}", &self.0.simple().to_string()[..8])
    }
}

/// What a successful join hands back: a stable rank and the full group size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub rank: Rank,
    pub world_size: usize,
    pub member_id: MemberId,
}

/// Transport contract required by the process group.
///
/// Implementations must block cooperatively (condition variable or sleeping
/// poll) and never spin.
pub trait Rendezvous: Send + Sync {
    /// Human-readable transport name (stable).
    fn name(&self) -> &'static str;

    /// Block until `world_size` members joined or `timeout` elapsed.
    fn join(&self, world_size: usize, timeout: Duration) -> Result<Membership>;

    /// Block until every member of the group reached the same barrier call.
    fn barrier(&self, membership: &Membership) -> Result<()>;

    /// Release the membership. After this the endpoint may join again.
    fn leave(&self, membership: &Membership) -> Result<()>;
}
