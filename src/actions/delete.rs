//! Plan execution.
//!
//! # Overview
//!
//! [`execute_plan`] carries out a [`RetentionPlan`]:
//! - **Simulate** (default): every deletion is reported, nothing is touched
//! - **Execute**: each candidate is moved to the system trash, or removed
//!   permanently when configured
//!
//! # Safety
//!
//! The plan is validated before the first deletion; an invalid plan deletes
//! nothing. Before each deletion the keeper of the decision must still exist
//! and the candidate's size must match the size seen during the scan. A file
//! that fails either check is skipped and reported. One failure never stops
//! the remaining deletions.
//!
//! # Example
//!
//! ```no_run
//! use tunedupe::actions::delete::{execute_plan, ExecutionConfig};
//! use tunedupe::retention::RetentionPlan;
//!
//! let plan = RetentionPlan::default();
//! let report = execute_plan(&plan, &ExecutionConfig::simulate()).unwrap();
//! assert_eq!(report.bytes_freed, 0);
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progress::{phase, ProgressCallback};
use crate::retention::{PlanError, RetentionDecision, RetentionPlan};

/// Error type for a single deletion.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File size differs from the scan.
    #[error("file modified since scan: {path} (size {expected} -> {actual})")]
    Modified {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// The copy meant to survive is gone, so its duplicates are kept.
    #[error("keeper {keeper} is missing, not deleting {path}")]
    KeeperMissing { path: PathBuf, keeper: PathBuf },

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified { path: p, .. }
            | Self::KeeperMissing { path: p, .. }
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}

/// Whether deletions are carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Report the plan, touch nothing
    #[default]
    Simulate,
    /// Delete the candidates
    Execute,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simulate => f.write_str("simulate"),
            Self::Execute => f.write_str("execute"),
        }
    }
}

/// Configuration for plan execution.
#[derive(Clone, Default)]
pub struct ExecutionConfig {
    pub mode: ExecutionMode,
    /// Use permanent deletion instead of trash.
    pub permanent: bool,
    /// Stops issuing deletions once set
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ExecutionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionConfig")
            .field("mode", &self.mode)
            .field("permanent", &self.permanent)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ExecutionConfig {
    /// Dry run.
    #[must_use]
    pub fn simulate() -> Self {
        Self::default()
    }

    /// Delete to trash, or permanently when `permanent` is set.
    #[must_use]
    pub fn execute(permanent: bool) -> Self {
        Self {
            mode: ExecutionMode::Execute,
            permanent,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// A deletion that did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// What execution did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionReport {
    pub mode: ExecutionMode,
    pub permanent: bool,
    /// Files removed (execute mode)
    pub deleted: Vec<PathBuf>,
    /// Files that would be removed (simulate mode)
    pub simulated: Vec<PathBuf>,
    pub failures: Vec<DeleteFailure>,
    /// Bytes freed, or that would be freed in simulate mode
    pub bytes_freed: u64,
    /// Execution stopped early on shutdown
    pub interrupted: bool,
}

impl ExecutionReport {
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.deleted.len() + self.simulated.len()
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty() && !self.interrupted
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = match self.mode {
            ExecutionMode::Simulate => "Would delete",
            ExecutionMode::Execute if self.permanent => "Deleted",
            ExecutionMode::Execute => "Moved to trash",
        };
        let size = bytesize::ByteSize::b(self.bytes_freed);
        if self.failures.is_empty() {
            format!("{verb} {} file(s), {size}", self.success_count())
        } else {
            format!(
                "{verb} {} file(s), {} failed, {size}",
                self.success_count(),
                self.failure_count()
            )
        }
    }

    fn fail(&mut self, error: &DeleteError) {
        log::warn!("{}", error);
        self.failures.push(DeleteFailure {
            path: error.path().to_path_buf(),
            reason: error.to_string(),
        });
    }
}

/// Check that a file still has the size it was scanned with.
///
/// # Errors
///
/// `NotFound`, `PermissionDenied` or `Io` if the file cannot be stat'ed,
/// `Modified` if the size changed.
pub fn verify_size(path: &Path, expected: u64) -> Result<(), DeleteError> {
    let actual = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();
    if actual != expected {
        return Err(DeleteError::Modified {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Move a single file to the system trash.
///
/// # Errors
///
/// `TrashFailed` if the trash operation fails.
pub fn delete_to_trash(path: &Path) -> Result<(), DeleteError> {
    trash::delete(path).map_err(|e| DeleteError::TrashFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    log::info!("Moved to trash: {}", path.display());
    Ok(())
}

/// Permanently delete a single file.
///
/// # Errors
///
/// `NotFound` or `PermissionDenied` for the matching I/O errors,
/// `PermanentDeleteFailed` otherwise.
pub fn permanent_delete(path: &Path) -> Result<(), DeleteError> {
    fs::remove_file(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            DeleteError::from_io(path, e)
        }
        _ => DeleteError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    })?;
    log::info!("Permanently deleted: {}", path.display());
    Ok(())
}

/// Carry out a plan.
///
/// # Errors
///
/// [`PlanError::InvariantViolation`] if the plan is unsafe; nothing is
/// deleted in that case. Per-file failures are reported in the
/// [`ExecutionReport`] instead.
pub fn execute_plan(
    plan: &RetentionPlan,
    config: &ExecutionConfig,
) -> Result<ExecutionReport, PlanError> {
    plan.validate()?;

    let mut report = ExecutionReport {
        mode: config.mode,
        permanent: config.permanent,
        ..ExecutionReport::default()
    };

    let total = plan.deletion_count();
    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(phase::DELETE, total);
    }

    let mut index = 0;
    'decisions: for decision in &plan.decisions {
        let keeper_present = decision.keeper.path.exists();
        for candidate in &decision.deletions {
            if config.is_shutdown_requested() {
                log::info!("Shutdown requested, stopping deletions");
                report.interrupted = true;
                break 'decisions;
            }
            index += 1;
            if let Some(ref callback) = config.progress_callback {
                callback.on_progress(index, &candidate.path.to_string_lossy());
            }

            if !keeper_present {
                report.fail(&DeleteError::KeeperMissing {
                    path: candidate.path.clone(),
                    keeper: decision.keeper.path.clone(),
                });
                continue;
            }
            match delete_one(decision, &candidate.path, candidate.size, config) {
                Ok(()) => {
                    report.bytes_freed += candidate.size;
                    match config.mode {
                        ExecutionMode::Simulate => report.simulated.push(candidate.path.clone()),
                        ExecutionMode::Execute => report.deleted.push(candidate.path.clone()),
                    }
                    if let Some(ref callback) = config.progress_callback {
                        callback.on_item_completed(candidate.size);
                    }
                }
                Err(e) => report.fail(&e),
            }
        }
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(phase::DELETE);
    }
    log::info!("{}", report.summary());
    Ok(report)
}

fn delete_one(
    decision: &RetentionDecision,
    path: &Path,
    expected_size: u64,
    config: &ExecutionConfig,
) -> Result<(), DeleteError> {
    verify_size(path, expected_size)?;
    log::trace!(
        "Deleting {} (keeper {})",
        path.display(),
        decision.keeper.path.display()
    );
    match config.mode {
        ExecutionMode::Simulate => Ok(()),
        ExecutionMode::Execute if config.permanent => permanent_delete(path),
        ExecutionMode::Execute => delete_to_trash(path),
    }
}
