//! Context configuration that downstream crates can serialize/deserialize.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Number of cooperating processes expected at the join rendezvous.
    pub world_size: usize,

    /// Shared directory used as the rendezvous point between OS processes.
    /// `None` means a private, single-process group.
    pub rendezvous_dir: Option<String>,

    /// Deadline for the join rendezvous.
    pub join_timeout_ms: u64,

    /// Sleep between polls of a file-based rendezvous.
    pub poll_interval_ms: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            world_size: 1,
            rendezvous_dir: None,
            join_timeout_ms: 30_000,
            poll_interval_ms: 10,
        }
    }
}

impl ContextConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SHARDTAB_WORLD_SIZE`: number of processes in the group
    /// - `SHARDTAB_RENDEZVOUS_DIR`: shared rendezvous directory
    /// - `SHARDTAB_JOIN_TIMEOUT_MS`: join deadline in milliseconds
    /// - `SHARDTAB_POLL_INTERVAL_MS`: rendezvous poll interval in milliseconds
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("SHARDTAB_WORLD_SIZE") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.world_size = v;
            }
        }

        if let Ok(s) = std::env::var("SHARDTAB_RENDEZVOUS_DIR") {
            if !s.trim().is_empty() {
                cfg.rendezvous_dir = Some(s);
            }
        }

        if let Ok(s) = std::env::var("SHARDTAB_JOIN_TIMEOUT_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.join_timeout_ms = v;
            }
        }

        if let Ok(s) = std::env::var("SHARDTAB_POLL_INTERVAL_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.poll_interval_ms = v;
            }
        }

        cfg
    }

    pub fn with_world_size(mut self, world_size: usize) -> Self {
        self.world_size = world_size;
        self
    }

    pub fn with_rendezvous_dir(mut self, dir: impl Into<String>) -> Self {
        self.rendezvous_dir = Some(dir.into());
        self
    }

    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Reject configurations that can never produce a working group.
    pub fn validate(&self) -> Result<()> {
        if self.world_size == 0 {
            return Err(Error::Config("world_size must be at least 1".into()));
        }
        if self.world_size > 1 && self.rendezvous_dir.is_none() {
            return Err(Error::Config(format!(
                "world_size {} needs a rendezvous directory",
                self.world_size
            )));
        }
        Ok(())
    }
}
