//! Sync - Reconcile a working directory to a pinned revision
//!
//! Clones the requested branch, retries once on transient transfer failures
//! with a wiped directory, then hard resets to the target revision if the
//! cloned head differs.

mod request;

pub use request::{RevisionId, SyncRequest};

use crate::transport::{ResetMode, TransferError, Transport, classify};
use crate::workdir;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, info_span, warn};
use uuid::Uuid;

/// Clone attempts before a transient failure becomes fatal
pub const MAX_CLONE_ATTEMPTS: u32 = 2;

/// Why a synchronization failed
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Failed to clone because of a timeout from the git server ({attempts} attempt(s)): {source}")]
    ServerTimeout { attempts: u32, source: TransferError },

    #[error("Failed to clone ({attempts} attempt(s)): {source}")]
    Transfer { attempts: u32, source: TransferError },

    #[error("Failed to get HEAD information: {0}")]
    HeadResolution(#[source] TransferError),

    #[error("Failed to get work tree: {0}")]
    WorktreeAccess(#[source] TransferError),

    #[error("Failed to force reset to {target}: {source}")]
    Reset {
        target: RevisionId,
        source: TransferError,
    },

    #[error("Working directory {} is not empty and is not a clone of the requested repository", .0.display())]
    WorkingDirOccupied(PathBuf),
}

impl SyncError {
    /// Process exit status for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::Transfer { .. } => 4,
            SyncError::ServerTimeout { .. } => 5,
            SyncError::HeadResolution(_) | SyncError::WorktreeAccess(_) | SyncError::Reset { .. } => 6,
            SyncError::WorkingDirOccupied(_) => 7,
        }
    }

    /// Whether the failure happened after content was transferred
    pub fn is_post_clone(&self) -> bool {
        matches!(
            self,
            SyncError::HeadResolution(_) | SyncError::WorktreeAccess(_) | SyncError::Reset { .. }
        )
    }
}

/// Outcome of a successful synchronization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// Identifier of this run, also attached to its log span
    pub run_id: Uuid,

    pub clone_url: String,
    pub branch: String,
    pub target: RevisionId,
    pub working_dir: PathBuf,

    /// Clone attempts made (0 when an existing clone was reused)
    pub clone_attempts: u32,

    /// An existing clone in the working directory was reused
    pub reused_existing: bool,

    /// Head before reconciliation
    pub previous_head: Option<RevisionId>,

    /// A hard reset moved head to the target
    pub reset_performed: bool,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    fn begin(run_id: Uuid, request: &SyncRequest) -> Self {
        Self {
            run_id,
            clone_url: request.clone_url.clone(),
            branch: request.branch.clone(),
            target: request.target.clone(),
            working_dir: request.working_dir.clone(),
            clone_attempts: 0,
            reused_existing: false,
            previous_head: None,
            reset_performed: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// One-line human summary
    pub fn summarize(&self) -> String {
        let how = if self.reused_existing {
            "reused existing clone".to_string()
        } else {
            format!("{} clone attempt(s)", self.clone_attempts)
        };
        let reset = match (&self.previous_head, self.reset_performed) {
            (Some(prev), true) => format!(", reset from {}", prev.short()),
            _ => String::new(),
        };
        format!(
            "{} on {} at {} ({}{})",
            self.clone_url,
            self.branch,
            self.target.short(),
            how,
            reset
        )
    }
}

/// Drives a [`Transport`] to put a working directory at an exact revision
pub struct Synchronizer<T: Transport> {
    transport: T,
}

impl<T: Transport> Synchronizer<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one synchronization
    pub fn sync(&self, request: &SyncRequest) -> Result<SyncReport, SyncError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("sync", %run_id, branch = %request.branch);
        let _enter = span.enter();

        let mut report = SyncReport::begin(run_id, request);
        let dir = request.working_dir.as_path();

        if let Some(existing) = self.transport.open_existing(dir, &request.clone_url) {
            if self.reconcile_existing(existing, request, &mut report) {
                report.reused_existing = true;
                info!("Checked out {} on {} branch.", request.target, request.branch);
                return Ok(report.finish());
            }
            report.previous_head = None;
            workdir::wipe(dir);
        } else if !workdir::is_empty_dir(dir) {
            if !request.replace_existing {
                return Err(SyncError::WorkingDirOccupied(dir.to_path_buf()));
            }
            warn!("Replacing existing content in {:?}", dir);
            workdir::wipe(dir);
        }

        provision(dir);
        let mut handle = self.clone_with_retry(request, &mut report)?;

        let head = self
            .transport
            .head(&handle)
            .map_err(SyncError::HeadResolution)?;
        report.previous_head = Some(head.clone());

        if head != request.target {
            self.hard_reset(&mut handle, &head, &request.target)?;
            report.reset_performed = true;
        }

        info!("Checked out {} on {} branch.", request.target, request.branch);
        Ok(report.finish())
    }

    /// Clone, retrying exactly once on a transient failure
    fn clone_with_retry(
        &self,
        request: &SyncRequest,
        report: &mut SyncReport,
    ) -> Result<T::Handle, SyncError> {
        let dir = request.working_dir.as_path();
        let options = request.clone_options();
        info!("Cloning {} from {}...", options.reference(), request.clone_url);

        report.clone_attempts = 1;
        let mut outcome = self.transport.clone_repo(&request.clone_url, dir, &options);

        while report.clone_attempts < MAX_CLONE_ATTEMPTS {
            let err = match &outcome {
                Err(err) if classify::is_retriable(Some(err)) => err,
                _ => break,
            };
            warn!(error = %err, "Transient failure while cloning, trying again");
            if !workdir::wipe(dir).is_clean() {
                warn!("Working directory {:?} was not fully wiped before retry", dir);
            }
            provision(dir);
            report.clone_attempts += 1;
            outcome = self.transport.clone_repo(&request.clone_url, dir, &options);
        }

        let attempts = report.clone_attempts;
        outcome.map_err(|source| {
            if classify::indicates_timeout(&source) {
                SyncError::ServerTimeout { attempts, source }
            } else {
                SyncError::Transfer { attempts, source }
            }
        })
    }

    fn hard_reset(
        &self,
        handle: &mut T::Handle,
        head: &RevisionId,
        target: &RevisionId,
    ) -> Result<(), SyncError> {
        info!("HEAD is at {}.", head);
        info!("Hard resetting to {}...", target);

        self.transport
            .worktree(handle)
            .map_err(SyncError::WorktreeAccess)?;
        self.transport
            .reset(handle, target, ResetMode::Hard)
            .map_err(|source| SyncError::Reset {
                target: target.clone(),
                source,
            })
    }

    /// Try to bring an existing clone to the target without transferring.
    /// Returns false when the directory should be wiped and cloned afresh.
    fn reconcile_existing(
        &self,
        mut handle: T::Handle,
        request: &SyncRequest,
        report: &mut SyncReport,
    ) -> bool {
        let head = match self.transport.head(&handle) {
            Ok(head) => head,
            Err(e) => {
                warn!(error = %e, "Existing clone has no readable HEAD, recloning");
                return false;
            }
        };
        report.previous_head = Some(head.clone());

        if head == request.target {
            info!("Existing clone already at {}", head);
            return true;
        }

        match self.hard_reset(&mut handle, &head, &request.target) {
            Ok(()) => {
                report.reset_performed = true;
                true
            }
            Err(e) => {
                warn!(error = %e, "Existing clone cannot reach target locally, recloning");
                false
            }
        }
    }
}

fn provision(dir: &Path) {
    if let Err(e) = workdir::ensure_exists(dir) {
        warn!("Failed to mkdir {:?}: {}", dir, e);
    }
}
