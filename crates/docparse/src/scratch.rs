//! Scratch files for handing uploaded bytes to path-based decoders
//!
//! Every upload is staged into its own uniquely named file so decoders that
//! only accept a filesystem path (or shell out to an external tool) can read
//! it. A [`ScratchFile`] is released exactly once: explicitly through
//! [`ScratchFile::release`], or from `Drop` on any other exit path.
//!
//! Deletion is retried on lock/permission errors, which show up on platforms
//! where a decoder still holds the file open. Cleanup failures are logged and
//! counted but never returned to the caller.

use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ScratchConfig;
use crate::error::Result;

/// How deletion of a scratch file is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait between two attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(100),
        }
    }
}

impl From<&ScratchConfig> for RetryPolicy {
    fn from(config: &ScratchConfig) -> Self {
        Self {
            max_attempts: config.delete_attempts.max(1),
            delay: config.retry_delay(),
        }
    }
}

/// Removes a file from storage
pub trait FileRemover: Send + Sync {
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Removes files with `std::fs::remove_file`
#[derive(Debug, Default, Clone, Copy)]
pub struct FsRemover;

impl FileRemover for FsRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

/// Waits between deletion attempts
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Result of releasing one scratch file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// File deleted
    Removed { attempts: u32 },
    /// File was already gone
    AlreadyGone { attempts: u32 },
    /// Every attempt hit a lock/permission error
    Exhausted { attempts: u32, error: String },
    /// A non-retryable error stopped the retries
    Aborted { attempts: u32, error: String },
}

impl CleanupOutcome {
    /// Whether the file no longer exists
    pub fn is_clean(&self) -> bool {
        matches!(
            self,
            CleanupOutcome::Removed { .. } | CleanupOutcome::AlreadyGone { .. }
        )
    }
}

/// Lifetime counters for the scratch space
#[derive(Debug, Default)]
struct ScratchStats {
    staged: AtomicU64,
    released: AtomicU64,
    cleanup_failures: AtomicU64,
}

/// Point-in-time copy of the scratch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScratchStatsSnapshot {
    /// Files staged
    pub staged: u64,
    /// Files deleted (or found already gone)
    pub released: u64,
    /// Files whose deletion gave up
    pub cleanup_failures: u64,
}

/// Allocates and releases scratch files in one directory
#[derive(Clone)]
pub struct ScratchSpace {
    inner: Arc<ScratchInner>,
}

struct ScratchInner {
    dir: PathBuf,
    prefix: String,
    policy: RetryPolicy,
    remover: Arc<dyn FileRemover>,
    sleeper: Arc<dyn Sleeper>,
    stats: ScratchStats,
}

impl std::fmt::Debug for ScratchSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchSpace")
            .field("dir", &self.inner.dir)
            .field("prefix", &self.inner.prefix)
            .field("policy", &self.inner.policy)
            .finish()
    }
}

impl ScratchSpace {
    /// Create a scratch space from configuration
    pub fn new(config: &ScratchConfig) -> Self {
        ScratchSpaceBuilder::new(config.resolved_dir())
            .prefix(config.prefix.clone())
            .policy(RetryPolicy::from(config))
            .build()
    }

    /// Start building a scratch space rooted at `dir`
    pub fn builder(dir: impl Into<PathBuf>) -> ScratchSpaceBuilder {
        ScratchSpaceBuilder::new(dir)
    }

    /// Directory scratch files live in
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    /// Deletion retry policy
    pub fn policy(&self) -> RetryPolicy {
        self.inner.policy
    }

    /// Create the scratch directory if it does not exist yet
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.inner.dir)?;
        Ok(())
    }

    /// Current counter values
    pub fn stats(&self) -> ScratchStatsSnapshot {
        let stats = &self.inner.stats;
        ScratchStatsSnapshot {
            staged: stats.staged.load(Ordering::Relaxed),
            released: stats.released.load(Ordering::Relaxed),
            cleanup_failures: stats.cleanup_failures.load(Ordering::Relaxed),
        }
    }

    /// Write `bytes` to a new, uniquely named file ending in `extension`.
    ///
    /// The file is flushed, synced and closed before this returns, so any
    /// other reader of the path sees the complete contents. If writing fails
    /// the partially written file is removed.
    pub fn stage(&self, bytes: &[u8], extension: &str) -> Result<ScratchFile> {
        let mut file = tempfile::Builder::new()
            .prefix(&self.inner.prefix)
            .suffix(extension)
            .tempfile_in(&self.inner.dir)?;

        file.write_all(bytes)?;
        file.flush()?;
        file.as_file().sync_all()?;

        // Close the handle and take over deletion from `tempfile`.
        let path = file.into_temp_path().keep().map_err(|e| e.error)?;

        self.inner.stats.staged.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Staged {} bytes at {}", bytes.len(), path.display());

        Ok(ScratchFile {
            path,
            space: self.clone(),
            released: false,
        })
    }

    fn release_path(&self, path: &Path) -> CleanupOutcome {
        let outcome = self.remove_with_retry(path);
        let stats = &self.inner.stats;

        match &outcome {
            CleanupOutcome::Removed { attempts } | CleanupOutcome::AlreadyGone { attempts } => {
                stats.released.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    "Released scratch file {} after {} attempt(s)",
                    path.display(),
                    attempts
                );
            }
            CleanupOutcome::Exhausted { attempts, error } => {
                stats.cleanup_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    "Could not delete scratch file {} after {} attempts: {}",
                    path.display(),
                    attempts,
                    error
                );
            }
            CleanupOutcome::Aborted { attempts, error } => {
                stats.cleanup_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    "Error while deleting scratch file {} (attempt {}): {}",
                    path.display(),
                    attempts,
                    error
                );
            }
        }

        outcome
    }

    fn remove_with_retry(&self, path: &Path) -> CleanupOutcome {
        let policy = self.inner.policy;
        let max_attempts = policy.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.inner.remover.remove(path) {
                Ok(()) => return CleanupOutcome::Removed { attempts },
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return CleanupOutcome::AlreadyGone { attempts };
                }
                Err(e) if is_lock_error(&e) => {
                    if attempts >= max_attempts {
                        return CleanupOutcome::Exhausted {
                            attempts,
                            error: e.to_string(),
                        };
                    }
                    tracing::debug!(
                        "Scratch file {} is locked (attempt {}/{}), retrying in {:?}",
                        path.display(),
                        attempts,
                        max_attempts,
                        policy.delay
                    );
                    self.inner.sleeper.sleep(policy.delay);
                }
                Err(e) => {
                    return CleanupOutcome::Aborted {
                        attempts,
                        error: e.to_string(),
                    };
                }
            }
        }
    }
}

/// Lock or permission failures that may clear up on their own
fn is_lock_error(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }

    // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    #[cfg(windows)]
    if matches!(err.raw_os_error(), Some(32) | Some(33)) {
        return true;
    }

    false
}

/// Builder for [`ScratchSpace`]
pub struct ScratchSpaceBuilder {
    dir: PathBuf,
    prefix: String,
    policy: RetryPolicy,
    remover: Arc<dyn FileRemover>,
    sleeper: Arc<dyn Sleeper>,
}

impl ScratchSpaceBuilder {
    fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: ScratchConfig::default().prefix,
            policy: RetryPolicy::default(),
            remover: Arc::new(FsRemover),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn remover(mut self, remover: Arc<dyn FileRemover>) -> Self {
        self.remover = remover;
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn build(self) -> ScratchSpace {
        ScratchSpace {
            inner: Arc::new(ScratchInner {
                dir: self.dir,
                prefix: self.prefix,
                policy: self.policy,
                remover: self.remover,
                sleeper: self.sleeper,
                stats: ScratchStats::default(),
            }),
        }
    }
}

/// A staged upload on disk, owned by a single request
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    space: ScratchSpace,
    released: bool,
}

impl ScratchFile {
    /// Absolute path of the staged file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file, retrying per the space's policy
    pub fn release(mut self) -> CleanupOutcome {
        self.release_once()
    }

    fn release_once(&mut self) -> CleanupOutcome {
        self.released = true;
        self.space.release_path(&self.path)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if !self.released {
            self.release_once();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicU32;

    /// Fails with `kind` for the first `failures` calls, then deletes for real
    struct FlakyRemover {
        failures: u32,
        kind: io::ErrorKind,
        calls: AtomicU32,
    }

    impl FlakyRemover {
        fn new(failures: u32, kind: io::ErrorKind) -> Arc<Self> {
            Arc::new(Self {
                failures,
                kind,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FileRemover for FlakyRemover {
        fn remove(&self, path: &Path) -> io::Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(io::Error::new(self.kind, "file is in use"));
            }
            std::fs::remove_file(path)
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        sleeps: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.sleeps.lock().push(duration);
        }
    }

    fn space_with(
        dir: &Path,
        remover: Arc<dyn FileRemover>,
        sleeper: Arc<RecordingSleeper>,
    ) -> ScratchSpace {
        ScratchSpace::builder(dir)
            .remover(remover)
            .sleeper(sleeper)
            .build()
    }

    #[test]
    fn test_stage_writes_complete_file_with_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let space = ScratchSpace::builder(dir.path()).build();

        let scratch = space.stage(b"hello scratch", ".txt").unwrap();
        let path = scratch.path().to_path_buf();

        assert!(path.starts_with(dir.path()));
        assert!(path.to_string_lossy().ends_with(".txt"));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("docparse-"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello scratch");

        assert!(scratch.release().is_clean());
        assert!(!path.exists());
    }

    #[test]
    fn test_stage_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let space = ScratchSpace::builder(dir.path()).build();

        let a = space.stage(b"a", ".pdf").unwrap();
        let b = space.stage(b"b", ".pdf").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_stage_into_missing_dir_fails_with_io() {
        let dir = tempfile::tempdir().unwrap();
        let space = ScratchSpace::builder(dir.path().join("missing")).build();

        let err = space.stage(b"data", ".txt").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
        assert_eq!(space.stats().staged, 0);
    }

    #[test]
    fn test_ensure_dir_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let space = ScratchSpace::builder(dir.path().join("nested/scratch")).build();

        space.ensure_dir().unwrap();
        assert!(space.stage(b"data", ".txt").is_ok());
    }

    #[test]
    fn test_release_retries_locked_file_then_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let remover = FlakyRemover::new(2, io::ErrorKind::PermissionDenied);
        let sleeper = Arc::new(RecordingSleeper::default());
        let space = space_with(dir.path(), remover.clone(), sleeper.clone());

        let scratch = space.stage(b"locked", ".docx").unwrap();
        let path = scratch.path().to_path_buf();

        assert_eq!(scratch.release(), CleanupOutcome::Removed { attempts: 3 });
        assert!(!path.exists());
        assert_eq!(remover.calls(), 3);
        assert_eq!(
            *sleeper.sleeps.lock(),
            vec![Duration::from_millis(100), Duration::from_millis(100)]
        );
        assert_eq!(space.stats().released, 1);
        assert_eq!(space.stats().cleanup_failures, 0);
    }

    #[test]
    fn test_release_gives_up_after_three_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let remover = FlakyRemover::new(u32::MAX, io::ErrorKind::PermissionDenied);
        let sleeper = Arc::new(RecordingSleeper::default());
        let space = space_with(dir.path(), remover.clone(), sleeper.clone());

        let scratch = space.stage(b"stuck", ".pdf").unwrap();
        let path = scratch.path().to_path_buf();

        let outcome = scratch.release();
        assert!(matches!(outcome, CleanupOutcome::Exhausted { attempts: 3, .. }));
        assert_eq!(remover.calls(), 3);
        assert_eq!(sleeper.sleeps.lock().len(), 2);
        assert_eq!(space.stats().cleanup_failures, 1);

        // The fake never deleted it.
        assert!(path.exists());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_release_does_not_retry_other_errors() {
        let dir = tempfile::tempdir().unwrap();
        let remover = FlakyRemover::new(1, io::ErrorKind::Other);
        let sleeper = Arc::new(RecordingSleeper::default());
        let space = space_with(dir.path(), remover.clone(), sleeper.clone());

        let scratch = space.stage(b"data", ".txt").unwrap();
        let path = scratch.path().to_path_buf();

        let outcome = scratch.release();
        assert!(matches!(outcome, CleanupOutcome::Aborted { attempts: 1, .. }));
        assert_eq!(remover.calls(), 1);
        assert!(sleeper.sleeps.lock().is_empty());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_release_of_missing_file_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let space = ScratchSpace::builder(dir.path()).build();

        let scratch = space.stage(b"data", ".md").unwrap();
        std::fs::remove_file(scratch.path()).unwrap();

        assert_eq!(scratch.release(), CleanupOutcome::AlreadyGone { attempts: 1 });
        assert_eq!(space.stats().released, 1);
    }

    #[test]
    fn test_drop_releases_unreleased_file() {
        let dir = tempfile::tempdir().unwrap();
        let space = ScratchSpace::builder(dir.path()).build();

        let path = {
            let scratch = space.stage(b"dropped", ".json").unwrap();
            scratch.path().to_path_buf()
        };

        assert!(!path.exists());
        assert_eq!(space.stats().released, 1);
    }

    #[test]
    fn test_release_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let remover = FlakyRemover::new(0, io::ErrorKind::Other);
        let space = space_with(dir.path(), remover.clone(), Arc::default());

        let scratch = space.stage(b"once", ".html").unwrap();
        scratch.release();

        assert_eq!(remover.calls(), 1);
        assert_eq!(space.stats().released, 1);
    }

    #[test]
    fn test_policy_from_config() {
        let config = ScratchConfig {
            delete_attempts: 5,
            retry_delay_ms: 20,
            ..ScratchConfig::default()
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay, Duration::from_millis(20));
    }
}
