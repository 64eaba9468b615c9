//! Transport - The version-control capability the synchronizer drives
//!
//! The synchronizer never talks to git directly. It clones, reads head and
//! resets through [`Transport`], so the retry and reconciliation policy can be
//! exercised against any backend. [`Git2Transport`] is the libgit2 one.

pub mod classify;
mod git;
mod trust;

pub use classify::ErrorClass;
pub use git::{DEFAULT_TIMEOUT, Git2Transport, TransferClient};
pub use trust::TrustStore;

use crate::sync::RevisionId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options for a single clone attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneOptions {
    /// Branch to check out
    pub branch: String,

    /// Only fetch the requested branch
    pub single_branch: bool,

    /// Fetch tags along with the branch
    pub tags: bool,
}

impl CloneOptions {
    /// Single-branch, tagless clone of `branch`
    pub fn for_branch(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            single_branch: true,
            tags: false,
        }
    }

    /// Full reference name, e.g. `refs/heads/main`
    pub fn reference(&self) -> String {
        format!("refs/heads/{}", self.branch)
    }

    /// Fetch refspec limiting the remote to the requested branch
    pub fn refspec(&self) -> String {
        format!("+refs/heads/{0}:refs/remotes/origin/{0}", self.branch)
    }
}

/// How a reset treats the index and working tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetMode {
    /// Move head, overwrite index and working files, discard local changes
    Hard,
}

/// A failure reported by a transport operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransferError {
    /// Classification reported by the transport, if it knows one
    pub kind: Option<ErrorClass>,

    /// The transport saw the server time out
    pub timed_out: bool,

    /// Human-readable message
    pub message: String,
}

impl TransferError {
    /// Error with no structured classification
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: None,
            timed_out: false,
            message: message.into(),
        }
    }

    /// Error the transport knows is worth retrying
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: Some(ErrorClass::Transient),
            timed_out: false,
            message: message.into(),
        }
    }

    /// Error the transport knows is not worth retrying
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: Some(ErrorClass::Permanent),
            timed_out: false,
            message: message.into(),
        }
    }

    /// Mark the failure as a server timeout
    pub fn with_timeout(mut self) -> Self {
        self.timed_out = true;
        self
    }
}

/// Clone / head / reset capability
pub trait Transport {
    /// Live reference to a transferred working copy
    type Handle;

    /// Clone `url` into `dir` according to `options`
    fn clone_repo(
        &self,
        url: &str,
        dir: &Path,
        options: &CloneOptions,
    ) -> Result<Self::Handle, TransferError>;

    /// Open a working copy already present in `dir` if it was cloned from `url`
    fn open_existing(&self, _dir: &Path, _url: &str) -> Option<Self::Handle> {
        None
    }

    /// Revision currently checked out
    fn head(&self, handle: &Self::Handle) -> Result<RevisionId, TransferError>;

    /// Mutable view of the working tree, returned as its root path
    fn worktree(&self, handle: &mut Self::Handle) -> Result<PathBuf, TransferError>;

    /// Move head to `target`
    fn reset(
        &self,
        handle: &mut Self::Handle,
        target: &RevisionId,
        mode: ResetMode,
    ) -> Result<(), TransferError>;
}
