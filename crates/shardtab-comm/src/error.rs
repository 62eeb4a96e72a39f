use std::time::Duration;

use thiserror::Error;

/// Result type local to shardtab-comm.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("join timed out after {timeout:?}: {joined} of {world_size} members present")]
    JoinTimeout {
        timeout: Duration,
        joined: usize,
        world_size: usize,
    },

    #[error("this process already holds an active group membership")]
    DuplicateJoin,

    #[error("group membership already released")]
    AlreadyLeft,

    #[error("no active group membership")]
    NotActive,

    #[error("invalid world size {0}")]
    InvalidWorldSize(usize),

    #[error("world size mismatch: this member expects {expected}, group was formed with {found}")]
    WorldSizeMismatch { expected: usize, found: usize },

    #[error("group of {0} members is already full")]
    GroupFull(usize),

    #[error("rendezvous transport error: {0}")]
    Transport(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Transport(format!("member record: {e}"))
    }
}
