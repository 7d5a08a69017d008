// ABOUTME: Integration tests for the local deploy lock.
// ABOUTME: One deployment at a time per state directory; stale locks are broken.

use chrono::{Duration, Utc};
use std::fs;
use switchyard::deploy::{DeployError, DeployLock, LockInfo};

#[test]
fn second_acquire_is_refused_until_release() {
    let dir = tempfile::tempdir().unwrap();

    let first = DeployLock::acquire(dir.path(), false).unwrap();
    let err = DeployLock::acquire(dir.path(), false).unwrap_err();
    assert!(matches!(err, DeployError::LockHeld { .. }));

    first.release().unwrap();
    let again = DeployLock::acquire(dir.path(), false).unwrap();
    assert!(again.broken().is_none());
}

#[test]
fn lock_file_names_its_holder() {
    let dir = tempfile::tempdir().unwrap();
    let lock = DeployLock::acquire(dir.path(), false).unwrap();

    let info: LockInfo = serde_json::from_slice(&fs::read(lock.path()).unwrap()).unwrap();
    assert_eq!(info.pid, std::process::id());
    assert!(!info.is_stale());
}

#[test]
fn stale_lock_is_broken_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    let stale = LockInfo {
        holder: "ci-runner".to_string(),
        pid: 4242,
        started_at: Utc::now() - Duration::hours(2),
    };
    fs::write(
        LockInfo::lock_path(dir.path()),
        serde_json::to_vec(&stale).unwrap(),
    )
    .unwrap();

    let lock = DeployLock::acquire(dir.path(), false).unwrap();
    assert_eq!(lock.broken().map(|i| i.holder.as_str()), Some("ci-runner"));
}

#[test]
fn force_breaks_a_fresh_lock() {
    let dir = tempfile::tempdir().unwrap();
    let _held = DeployLock::acquire(dir.path(), false).unwrap();

    let forced = DeployLock::acquire(dir.path(), true).unwrap();
    assert!(forced.broken().is_some());
}
