//! Configuration - Sync definition files and their CLI overrides

use crate::sync::{RevisionId, SyncRequest};
use crate::transport::{DEFAULT_TIMEOUT, TransferClient, TrustStore};
use crate::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default config file name inside the per-user config directory
pub const CONFIG_FILE_NAME: &str = "gitpin.yaml";

/// On-disk sync definition (YAML, or JSON by `.json` extension)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncFile {
    /// Where to clone from and what to pin
    pub repository: RepositorySection,

    /// Destination working directory
    pub working_dir: Option<PathBuf>,

    /// Transfer client settings
    pub transfer: TransferSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositorySection {
    pub url: Option<String>,
    pub branch: Option<String>,
    pub revision: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransferSection {
    /// Transfer timeout in seconds
    pub timeout_secs: Option<u64>,

    /// PEM bundle of trusted CA certificates
    pub ca_bundle: Option<PathBuf>,
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub branch: Option<String>,
    pub revision: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub ca_bundle: Option<PathBuf>,
    pub replace_existing: bool,
}

/// Fully merged configuration for one run
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub request: SyncRequest,
    pub timeout: Duration,
    pub ca_bundle: Option<PathBuf>,
}

impl SyncFile {
    /// Load a definition file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        debug!("Loaded config from {:?}", path);
        Ok(file)
    }

    /// Per-user default location, e.g. `~/.config/gitpin/gitpin.yaml`
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gitpin").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load the default file if there is one, else an empty definition
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply overrides and validate
    pub fn resolve(self, overrides: Overrides) -> Result<ResolvedConfig> {
        let url = require(overrides.url.or(self.repository.url), "repository url")?;
        let branch = require(overrides.branch.or(self.repository.branch), "branch")?;
        let revision = require(overrides.revision.or(self.repository.revision), "revision")?;
        let working_dir = require(overrides.working_dir.or(self.working_dir), "working directory")?;

        if url.trim().is_empty() {
            return Err(Error::Validation("repository url is empty".to_string()));
        }
        if branch.trim().is_empty() || branch.starts_with("refs/") {
            return Err(Error::Validation(format!(
                "branch must be a plain branch name, got {:?}",
                branch
            )));
        }

        let timeout = match overrides.timeout_secs.or(self.transfer.timeout_secs) {
            Some(0) => {
                return Err(Error::Validation("timeout must be positive".to_string()));
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        let request = SyncRequest::new(url, branch, RevisionId::parse(&revision)?, working_dir)
            .with_replace_existing(overrides.replace_existing);

        Ok(ResolvedConfig {
            request,
            timeout,
            ca_bundle: overrides.ca_bundle.or(self.transfer.ca_bundle),
        })
    }
}

impl ResolvedConfig {
    /// Load the configured CA bundle, or discover a system one
    pub fn trust_store(&self) -> Result<TrustStore> {
        load_trust_store(self.ca_bundle.as_deref())
    }

    /// Build the transfer client for this run
    pub fn transfer_client(&self) -> Result<TransferClient> {
        TransferClient::new(self.trust_store()?, self.timeout)
    }
}

/// Explicit bundle if given, otherwise discovery
pub fn load_trust_store(ca_bundle: Option<&Path>) -> Result<TrustStore> {
    match ca_bundle {
        Some(path) => TrustStore::from_pem_file(path),
        None => TrustStore::discover(),
    }
}

fn require<T>(value: Option<T>, what: &str) -> Result<T> {
    value.ok_or_else(|| Error::Validation(format!("no {} given (flag, env or config file)", what)))
}
