// ABOUTME: Deploy lock to prevent concurrent deployments on the same host.
// ABOUTME: Atomic create-new of <state_dir>/deploy.lock holding the holder's identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::DeployError;

const LOCK_FILE: &str = "deploy.lock";

/// Information about who holds a deploy lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn current() -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
        }
    }

    /// Check if this lock is stale (older than 1 hour).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }

    pub fn lock_path(state_dir: &Path) -> PathBuf {
        state_dir.join(LOCK_FILE)
    }
}

/// A held deploy lock. Release it explicitly with [`DeployLock::release`].
#[derive(Debug)]
pub struct DeployLock {
    path: PathBuf,
    broken: Option<LockInfo>,
}

impl DeployLock {
    /// Acquire the lock in `state_dir`.
    ///
    /// Stale locks (over an hour old) and unreadable lock files are broken
    /// automatically; `force` breaks any lock.
    pub fn acquire(state_dir: &Path, force: bool) -> Result<Self, DeployError> {
        fs::create_dir_all(state_dir).map_err(|e| {
            DeployError::lock_error(format!(
                "failed to create state directory {}: {}",
                state_dir.display(),
                e
            ))
        })?;

        let path = LockInfo::lock_path(state_dir);
        if Self::try_create(&path)? {
            return Ok(Self { path, broken: None });
        }

        let existing = fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<LockInfo>(&bytes).ok());

        match &existing {
            Some(info) if !force && !info.is_stale() => {
                return Err(DeployError::lock_held(
                    info.holder.clone(),
                    info.pid,
                    info.started_at,
                ));
            }
            Some(info) => tracing::warn!(
                "breaking {} lock held by {} (pid {}) since {}",
                if force { "forced" } else { "stale" },
                info.holder,
                info.pid,
                info.started_at
            ),
            None => tracing::warn!("lock file {} unreadable, breaking it", path.display()),
        }

        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DeployError::lock_error(format!(
                    "failed to remove {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        if !Self::try_create(&path)? {
            return Err(DeployError::lock_error(
                "lock acquired by another process during break",
            ));
        }

        Ok(Self {
            path,
            broken: existing,
        })
    }

    /// Create the lock file if it does not exist. `false` means it does.
    fn try_create(path: &Path) -> Result<bool, DeployError> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => {
                return Err(DeployError::lock_error(format!(
                    "failed to create {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let json = serde_json::to_vec(&LockInfo::current())
            .map_err(|e| DeployError::lock_error(format!("failed to serialize lock: {}", e)))?;
        file.write_all(&json)
            .and_then(|()| file.sync_all())
            .map_err(|e| DeployError::lock_error(format!("failed to write lock: {}", e)))?;
        Ok(true)
    }

    /// The lock that had to be broken to acquire this one, if any.
    pub fn broken(&self) -> Option<&LockInfo> {
        self.broken.as_ref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock.
    pub fn release(self) -> std::io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
