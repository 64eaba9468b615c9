//! What to synchronize: repository, branch, exact revision, destination

use crate::transport::CloneOptions;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Hex length of a SHA-1 object id
const SHA1_HEX_LEN: usize = 40;
/// Hex length of a SHA-256 object id
const SHA256_HEX_LEN: usize = 64;

/// A full, lowercase hex object id. Abbreviated ids are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionId(String);

impl RevisionId {
    /// Parse a full hex revision id
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != SHA1_HEX_LEN && s.len() != SHA256_HEX_LEN {
            return Err(Error::InvalidRevision(format!(
                "{:?} is not a full {}- or {}-digit hash",
                s, SHA1_HEX_LEN, SHA256_HEX_LEN
            )));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidRevision(format!("{:?} is not hexadecimal", s)));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight digits, for log lines
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RevisionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RevisionId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<RevisionId> for String {
    fn from(rev: RevisionId) -> Self {
        rev.0
    }
}

/// One synchronization job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Remote URL (https, http, file or a local path)
    pub clone_url: String,

    /// Branch to clone; resolved to `refs/heads/{branch}`
    pub branch: String,

    /// Exact revision the working directory must end up at
    pub target: RevisionId,

    /// Destination working directory, created if absent
    pub working_dir: PathBuf,

    /// Wipe a non-empty working directory that is not a clone of `clone_url`
    #[serde(default)]
    pub replace_existing: bool,
}

impl SyncRequest {
    /// Create a new request
    pub fn new(
        clone_url: impl Into<String>,
        branch: impl Into<String>,
        target: RevisionId,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            clone_url: clone_url.into(),
            branch: branch.into(),
            target,
            working_dir: working_dir.into(),
            replace_existing: false,
        }
    }

    /// Allow wiping unrelated content in the working directory
    pub fn with_replace_existing(mut self, replace: bool) -> Self {
        self.replace_existing = replace;
        self
    }

    /// Clone options for this request
    pub fn clone_options(&self) -> CloneOptions {
        CloneOptions::for_branch(&self.branch)
    }
}
