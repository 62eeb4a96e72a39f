//! Shared-directory rendezvous for separate OS processes on one host (or a
//! shared filesystem).
//!
//! Layout inside the rendezvous directory:
//! - `join.lock`: held (exclusive create) while a member changes membership.
//! - `rank-<r>.json`: member record for rank slot `r`.
//! - `group.json`: written by the member that completes the group; names the
//!   session (the rank-0 member id) and the world size. While it exists the
//!   group is formed and later joiners get `GroupFull`.
//! - `session-<id>/barrier-<epoch>-<r>`: marker written when rank `r` reaches
//!   barrier `epoch`.
//!
//! Claiming a slot, completing the group and withdrawing on timeout all
//! happen under `join.lock`, so a member that timed out never ends up in a
//! formed group. The world size of a forming group is the one the first
//! member brought; a joiner that disagrees is turned away without touching
//! the waiting members.
//!
//! `leave` doubles as a shutdown barrier. The last member to leave removes
//! `group.json` and the session directory, leaving the directory as it found
//! it. The directory must not hold files from a run that crashed.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shardtab_core::id::Rank;

use crate::error::{Error, Result};
use crate::rendezvous::{MemberId, Membership, Rendezvous};

/// Longest wait for `join.lock` before assuming it was left by a dead process.
const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemberRecord {
    rank: usize,
    world_size: usize,
    member_id: MemberId,
    pid: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GroupRecord {
    session: MemberId,
    world_size: usize,
}

#[derive(Debug)]
struct Active {
    membership: Membership,
    session: MemberId,
    barrier_epoch: u64,
}

/// Exclusive hold on `join.lock`; released on drop.
struct DirLock {
    path: PathBuf,
}

impl DirLock {
    fn acquire(path: PathBuf, poll_interval: Duration) -> Result<Self> {
        let deadline = Instant::now() + LOCK_TIMEOUT;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return Err(Error::Transport(format!(
                            "rendezvous lock {} held for over {:?}; remove it if no run is active",
                            path.display(),
                            LOCK_TIMEOUT
                        )));
                    }
                    thread::sleep(poll_interval);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release rendezvous lock");
        }
    }
}

fn write_record(file: &mut File, record: &MemberRecord) -> Result<()> {
    file.write_all(&serde_json::to_vec(record)?)?;
    file.sync_all()?;
    Ok(())
}

pub struct FsRendezvous {
    dir: PathBuf,
    poll_interval: Duration,
    active: Mutex<Option<Active>>,
}

impl FsRendezvous {
    pub fn new(dir: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            poll_interval,
            active: Mutex::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn lock(&self) -> Result<DirLock> {
        DirLock::acquire(self.dir.join("join.lock"), self.poll_interval)
    }

    fn rank_path(&self, rank: usize) -> PathBuf {
        self.dir.join(format!("rank-{rank}.json"))
    }

    fn group_path(&self) -> PathBuf {
        self.dir.join("group.json")
    }

    fn session_dir(&self, session: &MemberId) -> PathBuf {
        self.dir.join(format!("session-{}", session.0.simple()))
    }

    fn barrier_path(&self, session: &MemberId, epoch: u64, rank: usize) -> PathBuf {
        self.session_dir(session)
            .join(format!("barrier-{epoch}-{rank}"))
    }

    /// Claim the lowest free rank slot with an exclusive create.
    fn claim(&self, world_size: usize, member_id: MemberId) -> Result<usize> {
        self.claim_with(world_size, |file, rank| {
            let record = MemberRecord {
                rank,
                world_size,
                member_id,
                pid: std::process::id(),
            };
            write_record(file, &record)
        })
    }

    /// A slot whose record cannot be written is given back.
    fn claim_with<W>(&self, world_size: usize, mut write: W) -> Result<usize>
    where
        W: FnMut(&mut File, usize) -> Result<()>,
    {
        for rank in 0..world_size {
            let path = self.rank_path(rank);
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(f) => f,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            let written = write(&mut file, rank);
            drop(file);
            if let Err(e) = written {
                self.release_slot(rank);
                return Err(e);
            }
            return Ok(rank);
        }
        Err(Error::GroupFull(world_size))
    }

    /// Member records currently present. Unparsable files are skipped.
    fn read_records(&self) -> Result<Vec<MemberRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !(name.starts_with("rank-") && name.ends_with(".json")) {
                continue;
            }
            let Ok(bytes) = fs::read(entry.path()) else {
                continue;
            };
            if let Ok(record) = serde_json::from_slice::<MemberRecord>(&bytes) {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// The formed group, if any. A record still being written reads as absent.
    fn read_group(&self) -> Option<GroupRecord> {
        let bytes = fs::read(self.group_path()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn write_group(&self, group: &GroupRecord) -> Result<()> {
        fs::write(self.group_path(), serde_json::to_vec(group)?)?;
        Ok(())
    }

    /// Take a rank slot, completing the group if this member is the last one.
    fn enter(&self, world_size: usize, member_id: MemberId) -> Result<usize> {
        let _lock = self.lock()?;
        let group = self.read_group();
        let records = self.read_records()?;

        let formed_with = group.as_ref().map(|g| g.world_size).or_else(|| {
            records
                .iter()
                .min_by_key(|r| r.rank)
                .map(|r| r.world_size)
        });
        if let Some(found) = formed_with {
            if found != world_size {
                return Err(Error::WorldSizeMismatch {
                    expected: world_size,
                    found,
                });
            }
        }
        if group.is_some() {
            return Err(Error::GroupFull(world_size));
        }

        let rank = self.claim(world_size, member_id)?;
        if records.len() + 1 == world_size {
            let session = records
                .iter()
                .find(|r| r.rank == 0)
                .map(|r| r.member_id)
                .unwrap_or(member_id);
            let group = GroupRecord {
                session,
                world_size,
            };
            if let Err(e) = self.write_group(&group) {
                self.release_slot(rank);
                return Err(e);
            }
            tracing::debug!(world_size, session = %session, "process group formed");
        }
        Ok(rank)
    }

    fn wait_barrier(&self, active: &mut Active) -> Result<()> {
        let epoch = active.barrier_epoch;
        let rank = active.membership.rank.get();
        let world_size = active.membership.world_size;
        fs::create_dir_all(self.session_dir(&active.session))?;
        fs::write(self.barrier_path(&active.session, epoch, rank), b"")?;

        while !(0..world_size).all(|r| self.barrier_path(&active.session, epoch, r).exists()) {
            thread::sleep(self.poll_interval);
        }

        // Everyone passed `epoch`, so nobody still polls for our previous marker.
        if epoch > 0 {
            let _ = fs::remove_file(self.barrier_path(&active.session, epoch - 1, rank));
        }
        active.barrier_epoch += 1;
        Ok(())
    }

    fn release_slot(&self, rank: usize) {
        if let Err(e) = fs::remove_file(self.rank_path(rank)) {
            tracing::warn!(rank, error = %e, "failed to remove rank file");
        }
    }

    /// Remove what a finished session left behind. Best effort.
    fn clear_session(&self, session: &MemberId) {
        if let Err(e) = fs::remove_dir_all(self.session_dir(session)) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(error = %e, "failed to remove session directory");
            }
        }
        if let Err(e) = fs::remove_file(self.group_path()) {
            tracing::warn!(error = %e, "failed to remove group record");
        }
    }
}

impl Rendezvous for FsRendezvous {
    fn name(&self) -> &'static str {
        "fs"
    }

    fn join(&self, world_size: usize, timeout: Duration) -> Result<Membership> {
        let mut active = self.active.lock();
        if active.is_some() {
            return Err(Error::DuplicateJoin);
        }

        fs::create_dir_all(&self.dir)?;
        let deadline = Instant::now() + timeout;
        let member_id = MemberId::new();
        let rank = self.enter(world_size, member_id)?;
        tracing::debug!(rank, dir = %self.dir.display(), "claimed rank slot");

        let group = loop {
            if let Some(group) = self.read_group() {
                break group;
            }
            if Instant::now() >= deadline {
                let _lock = self.lock()?;
                if let Some(group) = self.read_group() {
                    break group;
                }
                let joined = self.read_records()?.len();
                self.release_slot(rank);
                return Err(Error::JoinTimeout {
                    timeout,
                    joined,
                    world_size,
                });
            }
            thread::sleep(self.poll_interval);
        };

        let membership = Membership {
            rank: Rank::new(rank),
            world_size,
            member_id,
        };
        *active = Some(Active {
            membership,
            session: group.session,
            barrier_epoch: 0,
        });
        Ok(membership)
    }

    fn barrier(&self, membership: &Membership) -> Result<()> {
        let mut guard = self.active.lock();
        match guard.as_mut() {
            Some(active) if active.membership == *membership => self.wait_barrier(active),
            _ => Err(Error::NotActive),
        }
    }

    /// Leave is a shutdown rendezvous: the rank file goes only after every
    /// member got here, and the last one out clears the session.
    fn leave(&self, membership: &Membership) -> Result<()> {
        let mut guard = self.active.lock();
        let session = match guard.as_mut() {
            Some(active) if active.membership == *membership => {
                self.wait_barrier(active)?;
                active.session
            }
            _ => return Err(Error::NotActive),
        };
        {
            let _lock = self.lock()?;
            fs::remove_file(self.rank_path(membership.rank.get()))?;
            if self.read_records()?.is_empty() {
                self.clear_session(&session);
            }
        }
        *guard = None;
        Ok(())
    }
}
