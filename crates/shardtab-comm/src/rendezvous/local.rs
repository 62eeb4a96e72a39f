//! In-process rendezvous: every `LocalEndpoint` of one `LocalHub` plays the
//! part of a separate process.
//!
//! Used for single-process runs (a private hub with one endpoint) and for
//! simulated multi-process tests where each thread owns an endpoint.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use shardtab_core::id::Rank;

use crate::error::{Error, Result};
use crate::rendezvous::{MemberId, Membership, Rendezvous};

#[derive(Debug, Default)]
struct HubState {
    /// Group size fixed by the first joiner of a session.
    world_size: Option<usize>,
    /// Rank slots; `Some` once claimed.
    members: Vec<Option<MemberId>>,
    /// All slots claimed; joins after this point get `GroupFull`.
    ready: bool,
    departed: usize,
    barrier_waiting: usize,
    barrier_epoch: u64,
}

impl HubState {
    fn joined(&self) -> usize {
        self.members.iter().filter(|m| m.is_some()).count()
    }

    fn holds(&self, membership: &Membership) -> bool {
        self.ready
            && self
                .members
                .get(membership.rank.get())
                .is_some_and(|m| *m == Some(membership.member_id))
    }

    fn reset(&mut self) {
        *self = HubState {
            barrier_epoch: self.barrier_epoch,
            ..HubState::default()
        };
    }
}

/// Shared meeting point for a set of in-process endpoints.
#[derive(Debug, Default)]
pub struct LocalHub {
    state: Mutex<HubState>,
    cv: Condvar,
}

impl LocalHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A new endpoint, i.e. a new simulated process.
    pub fn endpoint(self: &Arc<Self>) -> LocalEndpoint {
        LocalEndpoint {
            hub: Arc::clone(self),
            active: Mutex::new(None),
        }
    }

    fn join(&self, world_size: usize, timeout: Duration) -> Result<Membership> {
        let mut state = self.state.lock();

        match state.world_size {
            Some(n) if n != world_size => {
                return Err(Error::WorldSizeMismatch {
                    expected: world_size,
                    found: n,
                })
            }
            Some(_) => {}
            None => {
                state.world_size = Some(world_size);
                state.members = vec![None; world_size];
            }
        }
        if state.ready {
            return Err(Error::GroupFull(world_size));
        }

        // Lowest free slot; slots freed by timed-out joiners get reused.
        let slot = state
            .members
            .iter()
            .position(|m| m.is_none())
            .ok_or(Error::GroupFull(world_size))?;
        let member_id = MemberId::new();
        state.members[slot] = Some(member_id);

        if state.joined() == world_size {
            state.ready = true;
            self.cv.notify_all();
        } else {
            let result = self
                .cv
                .wait_while_for(&mut state, |s| !s.ready, timeout);
            if result.timed_out() && !state.ready {
                let joined = state.joined();
                state.members[slot] = None;
                if state.joined() == 0 {
                    state.reset();
                }
                return Err(Error::JoinTimeout {
                    timeout,
                    joined,
                    world_size,
                });
            }
        }

        Ok(Membership {
            rank: Rank::new(slot),
            world_size,
            member_id,
        })
    }

    fn barrier(&self, membership: &Membership) -> Result<()> {
        let mut state = self.state.lock();
        if !state.holds(membership) {
            return Err(Error::NotActive);
        }

        let epoch = state.barrier_epoch;
        state.barrier_waiting += 1;
        if state.barrier_waiting == membership.world_size {
            state.barrier_waiting = 0;
            state.barrier_epoch += 1;
            self.cv.notify_all();
            return Ok(());
        }
        self.cv.wait_while(&mut state, |s| s.barrier_epoch == epoch);
        Ok(())
    }

    fn leave(&self, membership: &Membership) -> Result<()> {
        let mut state = self.state.lock();
        if !state.holds(membership) {
            return Err(Error::NotActive);
        }
        state.departed += 1;
        if state.departed == membership.world_size {
            // Everyone is gone; the hub can host a fresh group.
            state.reset();
        }
        Ok(())
    }
}

/// One simulated process attached to a `LocalHub`.
#[derive(Debug)]
pub struct LocalEndpoint {
    hub: Arc<LocalHub>,
    active: Mutex<Option<MemberId>>,
}

impl LocalEndpoint {
    /// A private hub with a single endpoint: a one-process group.
    pub fn standalone() -> Self {
        LocalHub::new().endpoint()
    }
}

impl Rendezvous for LocalEndpoint {
    fn name(&self) -> &'static str {
        "local"
    }

    fn join(&self, world_size: usize, timeout: Duration) -> Result<Membership> {
        // Held across the hub wait so concurrent joins on one endpoint serialize.
        let mut active = self.active.lock();
        if active.is_some() {
            return Err(Error::DuplicateJoin);
        }
        let membership = self.hub.join(world_size, timeout)?;
        *active = Some(membership.member_id);
        Ok(membership)
    }

    fn barrier(&self, membership: &Membership) -> Result<()> {
        if *self.active.lock() != Some(membership.member_id) {
            return Err(Error::NotActive);
        }
        self.hub.barrier(membership)
    }

    fn leave(&self, membership: &Membership) -> Result<()> {
        let mut active = self.active.lock();
        if *active != Some(membership.member_id) {
            return Err(Error::NotActive);
        }
        self.hub.leave(membership)?;
        *active = None;
        Ok(())
    }
}
