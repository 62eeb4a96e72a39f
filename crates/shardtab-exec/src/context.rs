//! `DistributedContext`: process lifecycle around one `ProcessGroup`.
//!
//! Created -> Initialized -> Finalized. Table operations require
//! `Initialized`; a finalized context is permanently inert.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use shardtab_comm::{FsRendezvous, LocalEndpoint, ProcessGroup, Rendezvous};
use shardtab_core::config::ContextConfig;
use shardtab_core::id::Rank;

use crate::error::{ExecError, Result};
use crate::metrics::emit_span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Created,
    Initialized,
    Finalized,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Created => "created",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Finalized => "finalized",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub struct DistributedContext {
    config: ContextConfig,
    state: LifecycleState,
    group: Option<ProcessGroup>,
}

impl DistributedContext {
    /// A context that has not joined any group yet.
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            state: LifecycleState::Created,
            group: None,
        }
    }

    /// `new` followed by `initialize`.
    pub fn init(config: ContextConfig) -> Result<Self> {
        let mut ctx = Self::new(config);
        ctx.initialize()?;
        Ok(ctx)
    }

    /// Join through an explicitly supplied transport instead of the one the
    /// config describes. `rendezvous_dir` is ignored.
    pub fn init_with(transport: Arc<dyn Rendezvous>, config: ContextConfig) -> Result<Self> {
        let mut ctx = Self::new(config);
        ctx.join(transport)?;
        Ok(ctx)
    }

    /// Join the process group described by the config.
    ///
    /// Uses a shared-directory rendezvous when `rendezvous_dir` is set,
    /// otherwise a private single-process group.
    pub fn initialize(&mut self) -> Result<()> {
        if self.state != LifecycleState::Created {
            return Err(ExecError::ContextNotReady { state: self.state });
        }
        self.config.validate()?;
        let transport: Arc<dyn Rendezvous> = match &self.config.rendezvous_dir {
            Some(dir) => Arc::new(FsRendezvous::new(dir, self.config.poll_interval())),
            None => Arc::new(LocalEndpoint::standalone()),
        };
        self.join(transport)
    }

    fn join(&mut self, transport: Arc<dyn Rendezvous>) -> Result<()> {
        if self.state != LifecycleState::Created {
            return Err(ExecError::ContextNotReady { state: self.state });
        }
        let group = ProcessGroup::join(
            transport,
            self.config.world_size,
            self.config.join_timeout(),
        )?;
        emit_span(
            "context_initialized",
            &[
                ("rank", group.rank().get().to_string()),
                ("world_size", group.world_size().to_string()),
            ],
        );
        self.group = Some(group);
        self.state = LifecycleState::Initialized;
        Ok(())
    }

    /// Leave the process group. Calling it again, or on a context that never
    /// initialized, is a successful no-op.
    pub fn finalize(&mut self) -> Result<()> {
        match self.state {
            LifecycleState::Finalized => return Ok(()),
            LifecycleState::Created => {}
            LifecycleState::Initialized => {
                if let Some(group) = self.group.as_mut() {
                    group.leave()?;
                }
            }
        }
        self.state = LifecycleState::Finalized;
        tracing::debug!(rank = ?self.rank().map(|r| r.get()), "context finalized");
        Ok(())
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// This process's rank, once it has joined a group.
    pub fn rank(&self) -> Option<Rank> {
        self.group.as_ref().map(ProcessGroup::rank)
    }

    pub fn world_size(&self) -> Option<usize> {
        self.group.as_ref().map(ProcessGroup::world_size)
    }

    pub fn group(&self) -> Option<&ProcessGroup> {
        self.group.as_ref()
    }

    pub fn is_distributed(&self) -> bool {
        self.world_size().is_some_and(|n| n > 1)
    }

    /// The active group, or `ContextNotReady` unless initialized.
    pub fn ensure_ready(&self) -> Result<&ProcessGroup> {
        match (&self.group, self.state) {
            (Some(group), LifecycleState::Initialized) => Ok(group),
            (_, state) => Err(ExecError::ContextNotReady { state }),
        }
    }

    /// Block until every process in the group reaches this call.
    pub fn barrier(&self) -> Result<()> {
        self.ensure_ready()?.barrier()?;
        Ok(())
    }
}

impl Drop for DistributedContext {
    fn drop(&mut self) {
        if self.state == LifecycleState::Initialized {
            tracing::warn!(
                rank = ?self.rank().map(|r| r.get()),
                "context dropped without finalize"
            );
        }
    }
}
