//! gitpin - Pin a working directory to an exact git revision
//!
//! This library clones a branch of a remote repository into a working
//! directory and reconciles the result to one exact revision, retrying the
//! transfer once when it fails for transient network or TLS reasons.
//!
//! ## Core Concepts
//!
//! - **SyncRequest**: URL, branch, target revision and working directory for one run
//! - **Transport**: The clone / head / reset capability the synchronizer drives
//! - **ErrorClass**: Whether a transfer failure is worth a retry
//! - **Synchronizer**: Clone, classify, wipe-and-retry once, then hard reset if needed
//!
//! ## Failure Policy
//!
//! - **Transient** transfer failures (timeouts, TLS) get exactly one retry on a clean directory
//! - **Permanent** transfer failures abort immediately
//! - Anything after a successful transfer (head, worktree, reset) is never retried

pub mod cli;
pub mod config;
pub mod sync;
pub mod transport;
pub mod workdir;

pub use sync::{RevisionId, SyncError, SyncReport, SyncRequest, Synchronizer};
pub use transport::{
    CloneOptions, ErrorClass, Git2Transport, ResetMode, TransferClient, TransferError, Transport,
    TrustStore,
};

/// Result type for gitpin operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gitpin operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Failed to get CA certificates: {0}")]
    TrustMaterial(String),

    #[error("Invalid revision: {0}")]
    InvalidRevision(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl Error {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::TrustMaterial(_) => 3,
            Error::Sync(e) => e.exit_code(),
            Error::InvalidRevision(_) | Error::Validation(_) | Error::Yaml(_) | Error::Serialization(_) => 2,
            Error::Io(_) | Error::Git(_) => 1,
        }
    }
}
