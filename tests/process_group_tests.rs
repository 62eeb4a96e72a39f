//! Join/barrier/leave behaviour of ProcessGroup over both transports.


use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use shardtab_comm::{
    Error, FsRendezvous, GroupStatus, LocalEndpoint, LocalHub, ProcessGroup, Rendezvous,
};
use test_data_gen::temp_dir;

const TIMEOUT: Duration = Duration::from_secs(10);

fn endpoint(hub: &Arc<LocalHub>) -> Arc<dyn Rendezvous> {
    Arc::new(hub.endpoint())
}

#[test]
fn test_members_get_unique_ranks() {
    let hub = LocalHub::new();
    let world_size = 4;
    let handles: Vec<_> = (0..world_size)
        .map(|_| {
            let ep = endpoint(&hub);
            thread::spawn(move || {
                let mut group = ProcessGroup::join(ep, world_size, TIMEOUT).unwrap();
                assert_eq!(group.status(), GroupStatus::Active);
                let seen = (group.rank().get(), group.world_size());
                group.leave().unwrap();
                seen
            })
        })
        .collect();

    let mut ranks: Vec<usize> = handles
        .into_iter()
        .map(|h| {
            let (rank, ws) = h.join().unwrap();
            assert_eq!(ws, world_size);
            rank
        })
        .collect();
    ranks.sort_unstable();
    assert_eq!(ranks, vec![0, 1, 2, 3]);
}

#[test]
fn test_duplicate_join_on_one_endpoint() {
    let ep: Arc<dyn Rendezvous> = Arc::new(LocalEndpoint::standalone());
    let mut group = ProcessGroup::join(Arc::clone(&ep), 1, TIMEOUT).unwrap();
    let err = ProcessGroup::join(Arc::clone(&ep), 1, TIMEOUT).unwrap_err();
    assert!(matches!(err, Error::DuplicateJoin));

    // After leaving, the endpoint may join again.
    group.leave().unwrap();
    let mut again = ProcessGroup::join(ep, 1, TIMEOUT).unwrap();
    again.leave().unwrap();
}

#[test]
fn test_leave_twice_is_already_left() {
    let mut group =
        ProcessGroup::join(Arc::new(LocalEndpoint::standalone()), 1, TIMEOUT).unwrap();
    group.leave().unwrap();
    assert_eq!(group.status(), GroupStatus::Finalized);
    assert!(matches!(group.leave(), Err(Error::AlreadyLeft)));
    assert!(matches!(group.barrier(), Err(Error::NotActive)));
}

#[test]
fn test_zero_world_size_rejected() {
    let err = ProcessGroup::join(Arc::new(LocalEndpoint::standalone()), 0, TIMEOUT).unwrap_err();
    assert!(matches!(err, Error::InvalidWorldSize(0)));
}

#[test]
fn test_join_times_out_and_hub_recovers() {
    let hub = LocalHub::new();
    let err = ProcessGroup::join(endpoint(&hub), 2, Duration::from_millis(50)).unwrap_err();
    match err {
        Error::JoinTimeout {
            joined, world_size, ..
        } => {
            assert_eq!(joined, 1);
            assert_eq!(world_size, 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    // The abandoned slot is free again: a full group can still form.
    let a = endpoint(&hub);
    let t = thread::spawn(move || ProcessGroup::join(a, 2, TIMEOUT).map(|g| g.rank().get()));
    let b = ProcessGroup::join(endpoint(&hub), 2, TIMEOUT).unwrap();
    let other = t.join().unwrap().unwrap();
    assert_ne!(other, b.rank().get());
}

#[test]
fn test_world_size_mismatch() {
    let hub = LocalHub::new();
    let first = endpoint(&hub);
    let waiting = thread::spawn(move || {
        let mut g = ProcessGroup::join(first, 2, TIMEOUT).unwrap();
        g.leave().unwrap();
    });
    thread::sleep(Duration::from_millis(100));

    let err = ProcessGroup::join(endpoint(&hub), 3, TIMEOUT).unwrap_err();
    assert!(matches!(
        err,
        Error::WorldSizeMismatch {
            expected: 3,
            found: 2
        }
    ));

    let mut second = ProcessGroup::join(endpoint(&hub), 2, TIMEOUT).unwrap();
    second.leave().unwrap();
    waiting.join().unwrap();
}

#[test]
fn test_join_after_group_formed_is_full() {
    let hub = LocalHub::new();
    let mut g = ProcessGroup::join(endpoint(&hub), 1, TIMEOUT).unwrap();
    let err = ProcessGroup::join(endpoint(&hub), 1, TIMEOUT).unwrap_err();
    assert!(matches!(err, Error::GroupFull(1)));
    g.leave().unwrap();
}

#[test]
fn test_barrier_waits_for_everyone() {
    let hub = LocalHub::new();
    let world_size = 3;
    let arrived = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..world_size)
        .map(|_| {
            let ep = endpoint(&hub);
            let arrived = Arc::clone(&arrived);
            thread::spawn(move || {
                let mut group = ProcessGroup::join(ep, world_size, TIMEOUT).unwrap();
                for round in 1..=3 {
                    arrived.fetch_add(1, Ordering::SeqCst);
                    group.barrier().unwrap();
                    assert!(arrived.load(Ordering::SeqCst) >= round * world_size);
                    group.barrier().unwrap();
                }
                group.leave().unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(arrived.load(Ordering::SeqCst), 9);
}

#[test]
fn test_fs_rendezvous_forms_group() {
    let dir = temp_dir("fs-group");
    let world_size = 3;
    let handles: Vec<_> = (0..world_size)
        .map(|_| {
            let dir = dir.clone();
            thread::spawn(move || {
                let rdv: Arc<dyn Rendezvous> =
                    Arc::new(FsRendezvous::new(dir, Duration::from_millis(5)));
                let mut group = ProcessGroup::join(rdv, world_size, TIMEOUT).unwrap();
                group.barrier().unwrap();
                group.barrier().unwrap();
                let rank = group.rank().get();
                group.leave().unwrap();
                rank
            })
        })
        .collect();

    let mut ranks: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ranks.sort_unstable();
    assert_eq!(ranks, vec![0, 1, 2]);

    // The last member out clears rank files, the group record and barrier markers.
    let leftover: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name())
        .collect();
    assert!(leftover.is_empty(), "left behind: {leftover:?}");
}

fn fs_endpoint(dir: &std::path::Path) -> Arc<dyn Rendezvous> {
    Arc::new(FsRendezvous::new(dir, Duration::from_millis(5)))
}

#[test]
fn test_fs_duplicate_join_on_one_endpoint() {
    let dir = temp_dir("fs-duplicate");
    let ep = fs_endpoint(&dir);
    let mut group = ProcessGroup::join(Arc::clone(&ep), 1, TIMEOUT).unwrap();
    let err = ProcessGroup::join(Arc::clone(&ep), 1, TIMEOUT).unwrap_err();
    assert!(matches!(err, Error::DuplicateJoin));

    group.leave().unwrap();
    let mut again = ProcessGroup::join(ep, 1, TIMEOUT).unwrap();
    again.leave().unwrap();
}

#[test]
fn test_fs_world_size_mismatch_spares_waiting_member() {
    let dir = temp_dir("fs-mismatch");
    let first = fs_endpoint(&dir);
    let waiting = thread::spawn(move || {
        let mut g = ProcessGroup::join(first, 2, TIMEOUT).unwrap();
        g.barrier().unwrap();
        g.leave().unwrap();
    });
    thread::sleep(Duration::from_millis(100));

    let err = ProcessGroup::join(fs_endpoint(&dir), 3, TIMEOUT).unwrap_err();
    assert!(matches!(
        err,
        Error::WorldSizeMismatch {
            expected: 3,
            found: 2
        }
    ));

    let mut second = ProcessGroup::join(fs_endpoint(&dir), 2, TIMEOUT).unwrap();
    second.barrier().unwrap();
    second.leave().unwrap();
    waiting.join().unwrap();
}

#[test]
fn test_fs_join_after_group_formed_is_full() {
    let dir = temp_dir("fs-full");
    let mut g = ProcessGroup::join(fs_endpoint(&dir), 1, TIMEOUT).unwrap();
    let err = ProcessGroup::join(fs_endpoint(&dir), 1, TIMEOUT).unwrap_err();
    assert!(matches!(err, Error::GroupFull(1)));
    g.leave().unwrap();

    // Once everyone left, the directory hosts a new group.
    let mut next = ProcessGroup::join(fs_endpoint(&dir), 1, TIMEOUT).unwrap();
    next.leave().unwrap();
}

#[test]
fn test_fs_rendezvous_timeout_releases_slot() {
    let dir = temp_dir("fs-timeout");
    let rdv: Arc<dyn Rendezvous> = Arc::new(FsRendezvous::new(&dir, Duration::from_millis(5)));
    let err = ProcessGroup::join(rdv, 2, Duration::from_millis(50)).unwrap_err();
    assert!(matches!(err, Error::JoinTimeout { joined: 1, .. }));
    assert!(!dir.join("rank-0.json").exists());
}

#[test]
fn test_fs_completed_group_outlives_join_deadline() {
    let dir = temp_dir("fs-commit");
    let first = fs_endpoint(&dir);
    let waiting = thread::spawn(move || {
        let mut g = ProcessGroup::join(first, 2, TIMEOUT).unwrap();
        let rank = g.rank().get();
        g.barrier().unwrap();
        g.leave().unwrap();
        rank
    });
    thread::sleep(Duration::from_millis(100));

    // Completing the group commits it, even with no time left to wait.
    let mut last = ProcessGroup::join(fs_endpoint(&dir), 2, Duration::ZERO).unwrap();
    assert_eq!(last.rank().get(), 1);
    last.barrier().unwrap();
    last.leave().unwrap();
    assert_eq!(waiting.join().unwrap(), 0);
}
