//! `ProcessGroup`: the set of cooperating processes and the rendezvous and
//! barrier primitives binding them.
//!
//! A `ProcessGroup` value only exists after a successful join, so "not yet
//! joined" is simply the absence of a group. Once `leave` succeeds the group
//! is `Finalized` and every further call is a typed error.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shardtab_core::id::Rank;

use crate::error::{Error, Result};
use crate::rendezvous::{MemberId, Membership, Rendezvous};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupStatus {
    Active,
    Finalized,
}

pub struct ProcessGroup {
    transport: Arc<dyn Rendezvous>,
    membership: Membership,
    status: GroupStatus,
}

impl ProcessGroup {
    /// Join the group reachable through `transport`.
    ///
    /// Blocks until `expected_world_size` processes joined or `timeout`
    /// elapsed. Every member must pass the same `expected_world_size`.
    pub fn join(
        transport: Arc<dyn Rendezvous>,
        expected_world_size: usize,
        timeout: Duration,
    ) -> Result<Self> {
        if expected_world_size == 0 {
            return Err(Error::InvalidWorldSize(expected_world_size));
        }

        tracing::debug!(
            transport = transport.name(),
            world_size = expected_world_size,
            ?timeout,
            "joining process group"
        );
        let membership = match transport.join(expected_world_size, timeout) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(transport = transport.name(), error = %e, "join failed");
                return Err(e);
            }
        };
        debug_assert!(membership.rank.get() < membership.world_size);
        tracing::info!(
            rank = membership.rank.get(),
            world_size = membership.world_size,
            member = %membership.member_id,
            "joined process group"
        );

        Ok(Self {
            transport,
            membership,
            status: GroupStatus::Active,
        })
    }

    pub fn rank(&self) -> Rank {
        self.membership.rank
    }

    pub fn world_size(&self) -> usize {
        self.membership.world_size
    }

    pub fn member_id(&self) -> MemberId {
        self.membership.member_id
    }

    pub fn status(&self) -> GroupStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == GroupStatus::Active
    }

    /// Block until every member reaches the same barrier call.
    pub fn barrier(&self) -> Result<()> {
        if !self.is_active() {
            return Err(Error::NotActive);
        }
        tracing::trace!(rank = self.membership.rank.get(), "entering barrier");
        self.transport.barrier(&self.membership)
    }

    /// Release membership. Only the first successful call has an effect.
    pub fn leave(&mut self) -> Result<()> {
        if self.status == GroupStatus::Finalized {
            return Err(Error::AlreadyLeft);
        }
        self.transport.leave(&self.membership)?;
        self.status = GroupStatus::Finalized;
        tracing::info!(rank = self.membership.rank.get(), "left process group");
        Ok(())
    }
}

impl fmt::Debug for ProcessGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessGroup")
            .field("transport", &self.transport.name())
            .field("rank", &self.membership.rank.get())
            .field("world_size", &self.membership.world_size)
            .field("status", &self.status)
            .finish()
    }
}
