//! libgit2-backed transport

use super::{CloneOptions, ErrorClass, ResetMode, TransferError, Transport, TrustStore};
use crate::sync::RevisionId;
use crate::{Error, Result};
use git2::build::RepoBuilder;
use git2::{AutotagOption, ErrorCode, FetchOptions, Oid, Repository, ResetType};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

/// Transfer timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// libgit2 keeps CA locations and timeouts in process globals. Every transfer
/// holds this lock while it applies its own settings and runs.
static TRANSFER_LOCK: Mutex<()> = Mutex::new(());

/// Trust material and timeout for HTTP(S) transfers
#[derive(Debug, Clone)]
pub struct TransferClient {
    trust: TrustStore,
    timeout: Duration,
}

impl TransferClient {
    /// Create a client; the timeout must be positive
    pub fn new(trust: TrustStore, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::Validation("transfer timeout must be positive".to_string()));
        }
        Ok(Self { trust, timeout })
    }

    /// Client with the default timeout
    pub fn with_default_timeout(trust: TrustStore) -> Self {
        Self {
            trust,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn trust(&self) -> &TrustStore {
        &self.trust
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether this client handles the scheme of `url`
    pub fn handles(url: &str) -> bool {
        let lower = url.to_ascii_lowercase();
        lower.starts_with("https://") || lower.starts_with("http://")
    }

    /// Install this client's settings into libgit2. Caller must hold `TRANSFER_LOCK`.
    fn apply(&self, url: &str) -> std::result::Result<(), git2::Error> {
        let millis = i32::try_from(self.timeout.as_millis()).unwrap_or(i32::MAX);
        // SAFETY: these globals are written only here, with TRANSFER_LOCK held,
        // and read only by libgit2 network code running under the same lock.
        // `head`, `worktree` and `reset` run without the lock; they never
        // touch the network, so they never read the CA location or timeouts.
        unsafe {
            if url.to_ascii_lowercase().starts_with("https://") {
                git2::opts::set_ssl_cert_file(self.trust.bundle_path())?;
            }
            git2::opts::set_server_connect_timeout_in_milliseconds(millis)?;
            git2::opts::set_server_timeout_in_milliseconds(millis)?;
        }
        debug!(
            "Transfer client: {} certificates from {:?}, timeout {:?}",
            self.trust.len(),
            self.trust.bundle_path(),
            self.timeout
        );
        Ok(())
    }
}

/// [`Transport`] implementation on top of `git2`
#[derive(Debug, Clone)]
pub struct Git2Transport {
    client: TransferClient,
}

impl Git2Transport {
    pub fn new(client: TransferClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &TransferClient {
        &self.client
    }
}

impl Transport for Git2Transport {
    type Handle = Repository;

    fn clone_repo(
        &self,
        url: &str,
        dir: &Path,
        options: &CloneOptions,
    ) -> std::result::Result<Repository, TransferError> {
        let _guard = TRANSFER_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        if TransferClient::handles(url) {
            self.client.apply(url)?;
        }

        let mut fetch = FetchOptions::new();
        fetch.download_tags(if options.tags {
            AutotagOption::Auto
        } else {
            AutotagOption::None
        });

        let mut builder = RepoBuilder::new();
        builder.branch(&options.branch);
        builder.fetch_options(fetch);
        if options.single_branch {
            let refspec = options.refspec();
            builder.remote_create(move |repo, name, url| repo.remote_with_fetch(name, url, &refspec));
        }

        let repo = builder.clone(url, dir)?;
        info!("Clone of {} completed into {:?}", options.reference(), dir);
        Ok(repo)
    }

    fn open_existing(&self, dir: &Path, url: &str) -> Option<Repository> {
        let repo = Repository::open(dir).ok()?;
        if repo.is_bare() {
            return None;
        }
        let same_origin = repo
            .find_remote("origin")
            .ok()
            .is_some_and(|remote| remote.url() == Some(url));
        if !same_origin {
            debug!("Existing repository in {:?} is not a clone of {}", dir, url);
            return None;
        }
        Some(repo)
    }

    fn head(&self, repo: &Repository) -> std::result::Result<RevisionId, TransferError> {
        let commit = repo.head()?.peel_to_commit()?;
        RevisionId::parse(&commit.id().to_string()).map_err(|e| TransferError::permanent(e.to_string()))
    }

    fn worktree(&self, repo: &mut Repository) -> std::result::Result<PathBuf, TransferError> {
        repo.workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| TransferError::permanent("repository has no working tree"))
    }

    fn reset(
        &self,
        repo: &mut Repository,
        target: &RevisionId,
        mode: ResetMode,
    ) -> std::result::Result<(), TransferError> {
        let oid = Oid::from_str(target.as_str())?;
        let object = repo.find_object(oid, None)?;
        let kind = match mode {
            ResetMode::Hard => ResetType::Hard,
        };
        repo.reset(&object, kind, None)?;
        Ok(())
    }
}

impl From<git2::Error> for TransferError {
    fn from(err: git2::Error) -> Self {
        // libgit2 reports socket timeouts as "timed out", which the message
        // heuristic would miss.
        let lower = err.message().to_lowercase();
        let timed_out = lower.contains("timed out") || lower.contains("timeout");
        let kind = match (err.class(), err.code()) {
            (git2::ErrorClass::Ssl, _) => Some(ErrorClass::Transient),
            (git2::ErrorClass::Net | git2::ErrorClass::Os | git2::ErrorClass::Http, _) if timed_out => {
                Some(ErrorClass::Transient)
            }
            (_, ErrorCode::NotFound | ErrorCode::Auth) => Some(ErrorClass::Permanent),
            _ => None,
        };
        Self {
            kind,
            timed_out,
            message: err.message().to_string(),
        }
    }
}
