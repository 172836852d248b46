//! Lock Coordinator
//!
//! Hands out `ScopedLock` guards over the table's sentinel file.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::utils::Backoff;
use fs2::FileExt;

use crate::config::LockPolicy;
use crate::error::{Result, StoreError};
use crate::storage::apply_file_mode;

/// Suffix appended to the table path to form the sentinel path
pub const LOCK_SUFFIX: &str = ".lock";

/// Sleep between attempts once spinning/yielding is exhausted
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Lock flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Many holders at once, excludes exclusive holders
    Shared,

    /// Single holder, excludes everyone else
    Exclusive,
}

/// Acquires shared/exclusive advisory locks for one table
///
/// Every acquisition opens its own handle on the sentinel, so two guards in
/// the same process contend exactly like guards in different processes.
#[derive(Debug, Clone)]
pub struct LockCoordinator {
    /// Sentinel file path ({table_path}.lock)
    path: PathBuf,

    /// Contention behaviour
    policy: LockPolicy,

    /// Permission bits for a freshly created sentinel
    file_mode: u32,
}

impl LockCoordinator {
    /// Create a coordinator for the table at `table_path`
    pub fn new(table_path: &Path, policy: LockPolicy, file_mode: u32) -> Self {
        Self {
            path: Self::sentinel_path(table_path),
            policy,
            file_mode,
        }
    }

    /// "{table}.csv" → "{table}.csv.lock"
    pub fn sentinel_path(table_path: &Path) -> PathBuf {
        let mut name = table_path.as_os_str().to_owned();
        name.push(LOCK_SUFFIX);
        PathBuf::from(name)
    }

    /// Acquire a shared (reader) lock
    pub fn acquire_shared(&self) -> Result<ScopedLock> {
        self.acquire(LockMode::Shared)
    }

    /// Acquire an exclusive (writer) lock
    pub fn acquire_exclusive(&self) -> Result<ScopedLock> {
        self.acquire(LockMode::Exclusive)
    }

    /// Acquire a lock in the given mode according to the configured policy
    ///
    /// Returns:
    /// - `Ok(guard)`: lock held until the guard drops
    /// - `Err(LockBusy)`: contended under `FailFast`
    /// - `Err(LockTimeout)`: still contended when the `Wait` timeout elapsed
    pub fn acquire(&self, mode: LockMode) -> Result<ScopedLock> {
        let file = self.open_sentinel()?;

        match self.policy {
            LockPolicy::FailFast => {
                if try_lock(&file, mode)? {
                    return Ok(ScopedLock::held(file, self.path.clone(), mode));
                }
                tracing::warn!("{:?} lock on {} is busy", mode, self.path.display());
                Err(StoreError::LockBusy {
                    path: self.path.clone(),
                })
            }
            LockPolicy::Wait { timeout } => {
                let started = Instant::now();
                let backoff = Backoff::new();

                loop {
                    if try_lock(&file, mode)? {
                        return Ok(ScopedLock::held(file, self.path.clone(), mode));
                    }

                    let waited = started.elapsed();
                    if waited >= timeout {
                        tracing::warn!(
                            "Gave up on {:?} lock on {} after {:?}",
                            mode,
                            self.path.display(),
                            waited
                        );
                        return Err(StoreError::LockTimeout {
                            path: self.path.clone(),
                            waited_ms: waited.as_millis() as u64,
                        });
                    }

                    if backoff.is_completed() {
                        thread::sleep(POLL_INTERVAL);
                    } else {
                        backoff.snooze();
                    }
                }
            }
        }
    }

    /// Get the sentinel file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the contention policy
    pub fn policy(&self) -> LockPolicy {
        self.policy
    }

    /// Open (creating if needed) a fresh handle on the sentinel
    fn open_sentinel(&self) -> Result<File> {
        let created = !self.path.exists();

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.path)?;

        if created {
            tracing::debug!("Created lock sentinel {}", self.path.display());
            apply_file_mode(&self.path, self.file_mode);
        }

        Ok(file)
    }
}

/// A held lock. Dropping it releases the lock.
#[derive(Debug)]
pub struct ScopedLock {
    /// Handle the OS lock is attached to
    file: File,

    /// Sentinel path (for logging)
    path: PathBuf,

    mode: LockMode,
}

impl ScopedLock {
    fn held(file: File, path: PathBuf, mode: LockMode) -> Self {
        tracing::debug!("Acquired {:?} lock on {}", mode, path.display());
        Self { file, path, mode }
    }

    /// Mode this guard holds
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Sentinel path this guard locks
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedLock {
    fn drop(&mut self) {
        // Closing the handle would release it too; unlocking explicitly lets
        // us log failures.
        match FileExt::unlock(&self.file) {
            Ok(()) => tracing::debug!("Released {:?} lock on {}", self.mode, self.path.display()),
            Err(e) => tracing::error!(
                "Failed to release {:?} lock on {}: {}",
                self.mode,
                self.path.display(),
                e
            ),
        }
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Non-blocking lock attempt: `Ok(false)` means contended
fn try_lock(file: &File, mode: LockMode) -> io::Result<bool> {
    let attempt = match mode {
        LockMode::Shared => FileExt::try_lock_shared(file),
        LockMode::Exclusive => FileExt::try_lock_exclusive(file),
    };

    match attempt {
        Ok(()) => Ok(true),
        Err(e) if is_contended(&e) => Ok(false),
        Err(e) => Err(e),
    }
}

/// EWOULDBLOCK on Unix, ERROR_LOCK_VIOLATION on Windows
fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || (e.raw_os_error().is_some()
            && e.raw_os_error() == fs2::lock_contended_error().raw_os_error())
}
