//! Locked snapshot store.
//!
//! Locking is advisory and coordinates matchscraper processes; it is not a
//! security boundary. The lock file is created with `O_EXCL` semantics so
//! two runs racing for it cannot both win, and carries the owner's PID so
//! a second run can report who holds it. A lock whose owner is dead can be
//! overridden with `--force`; a live owner never is.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Path, Utf8PathBuf};
use fd_lock::RwLock;
use matchscraper_utils::atomic_write::write_file_atomic;
use matchscraper_utils::error::StateError;
use matchscraper_utils::paths;
use matchscraper_utils::types::Match;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The persisted prior-run state: external match id to last-emitted match.
pub type Snapshot = BTreeMap<String, Match>;

/// Contents of the sidecar lock file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    /// Seconds since the UNIX epoch when the lock was taken.
    pub created_at: u64,
    pub run_id: String,
}

/// Open snapshot store holding the advisory exclusive lock.
///
/// The lock file is removed on [`Drop`]; exclusivity rests on the file's
/// existence, with an fd lock taken during the info write as insurance
/// against a partially written lock file being trusted.
#[derive(Debug)]
pub struct StateStore {
    state_path: Utf8PathBuf,
    lock_path: Utf8PathBuf,
    _lock_file: Option<Box<RwLock<fs::File>>>,
}

impl StateStore {
    /// Acquire the lock and open the store.
    ///
    /// `force` overrides a lock whose owning process is gone; a lock held
    /// by a live process always fails with [`StateError::Locked`].
    pub fn open(state_path: &Utf8Path, run_id: &str, force: bool) -> Result<Self, StateError> {
        let lock_path = paths::lock_file_for(state_path);
        if let Some(parent) = lock_path.parent() {
            paths::ensure_dir_all(parent)?;
        }

        match Self::try_create_lock(&lock_path, run_id) {
            Ok(lock_file) => Ok(Self {
                state_path: state_path.to_owned(),
                lock_path,
                _lock_file: Some(lock_file),
            }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let existing = Self::read_lock_info(&lock_path)?;
                if process_is_running(existing.pid) {
                    return Err(StateError::Locked {
                        pid: existing.pid,
                        created_ago: format_age(existing.created_at),
                    });
                }
                if !force {
                    // Owner is dead but we still refuse silently stealing:
                    // the operator confirms with --force.
                    return Err(StateError::Locked {
                        pid: existing.pid,
                        created_ago: format_age(existing.created_at),
                    });
                }
                warn!(
                    pid = existing.pid,
                    run_id = %existing.run_id,
                    "overriding stale state lock from dead process"
                );
                fs::remove_file(&lock_path)?;
                let lock_file = Self::try_create_lock(&lock_path, run_id)?;
                Ok(Self {
                    state_path: state_path.to_owned(),
                    lock_path,
                    _lock_file: Some(lock_file),
                })
            }
            Err(e) => Err(StateError::Io(e)),
        }
    }

    /// Atomically create the lock file and write our [`LockInfo`] into it.
    fn try_create_lock(
        lock_path: &Utf8Path,
        run_id: &str,
    ) -> Result<Box<RwLock<fs::File>>, io::Error> {
        let file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(lock_path.as_std_path())?;

        let info = LockInfo {
            pid: process::id(),
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            run_id: run_id.to_string(),
        };
        let json = serde_json::to_string_pretty(&info)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut lock = Box::new(RwLock::new(file));
        {
            let guard = lock
                .try_write()
                .map_err(|_| io::Error::new(io::ErrorKind::WouldBlock, "lock contended"))?;
            let mut file_ref = &*guard;
            file_ref.write_all(json.as_bytes())?;
            file_ref.flush()?;
            file_ref.sync_all()?;
        }
        debug!(path = %lock_path, "state lock acquired");
        Ok(lock)
    }

    fn read_lock_info(lock_path: &Utf8Path) -> Result<LockInfo, StateError> {
        let content = fs::read_to_string(lock_path.as_std_path())?;
        serde_json::from_str(&content).map_err(|e| StateError::CorruptSnapshot {
            path: lock_path.to_string(),
            reason: format!("lock file unreadable: {e}"),
        })
    }

    /// Load the prior snapshot. A missing file is an empty snapshot; a
    /// corrupt file is an error the operator resolves deliberately.
    pub fn load(&self) -> Result<Snapshot, StateError> {
        if !self.state_path.as_std_path().exists() {
            return Ok(Snapshot::new());
        }
        let content = fs::read_to_string(self.state_path.as_std_path())?;
        serde_json::from_str(&content).map_err(|e| StateError::CorruptSnapshot {
            path: self.state_path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Atomically replace the snapshot. Called once, at the end of a
    /// successful run.
    pub fn persist(&self, snapshot: &Snapshot) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(snapshot).map_err(|e| {
            StateError::PersistFailed {
                path: self.state_path.to_string(),
                reason: e.to_string(),
            }
        })?;
        write_file_atomic(&self.state_path, &json).map_err(|e| StateError::PersistFailed {
            path: self.state_path.to_string(),
            reason: e.to_string(),
        })?;
        debug!(path = %self.state_path, entries = snapshot.len(), "snapshot persisted");
        Ok(())
    }

    /// Lock info for the store currently holding the lock, if any.
    pub fn lock_info(state_path: &Utf8Path) -> Result<Option<LockInfo>, StateError> {
        let lock_path = paths::lock_file_for(state_path);
        if !lock_path.as_std_path().exists() {
            return Ok(None);
        }
        Self::read_lock_info(&lock_path).map(Some)
    }
}

impl Drop for StateStore {
    fn drop(&mut self) {
        self._lock_file.take();
        if self.lock_path.as_std_path().exists()
            && let Err(e) = fs::remove_file(self.lock_path.as_std_path())
        {
            warn!(path = %self.lock_path, error = %e, "failed to remove state lock");
        }
    }
}

/// Whether a process with `pid` is still alive.
fn process_is_running(pid: u32) -> bool {
    #[cfg(unix)]
    {
        // kill(pid, 0): 0 means alive, EPERM means alive but not ours.
        let rc = unsafe { libc::kill(pid as i32, 0) };
        if rc == 0 {
            true
        } else {
            matches!(
                io::Error::last_os_error().raw_os_error(),
                Some(code) if code == libc::EPERM
            )
        }
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        true
    }
}

/// Human-readable lock age for error messages.
fn format_age(created_at: u64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let age = now.saturating_sub(created_at);
    if age < 60 {
        format!("{age}s")
    } else if age < 3600 {
        format!("{}m", age / 60)
    } else if age < 86400 {
        format!("{}h", age / 3600)
    } else {
        format!("{}d", age / 86400)
    }
}
