#![forbid(unsafe_code)]
//! shardtab-comm: process-group coordination.
//!
//! The only cross-process synchronization points in the engine live here:
//! the join rendezvous at startup, explicit barriers, and leave at shutdown.
//! Everything is expressed against the `Rendezvous` trait so the transport
//! (threads in one process, a shared directory, ...) stays opaque to callers.

pub mod error;
pub mod group;
pub mod rendezvous;

pub use error::{Error, Result};
pub use group::{GroupStatus, ProcessGroup};
pub use rendezvous::fs::FsRendezvous;
pub use rendezvous::local::{LocalEndpoint, LocalHub};
pub use rendezvous::{MemberId, Membership, Rendezvous};
