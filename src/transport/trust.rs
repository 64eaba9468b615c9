//! Trusted CA certificates for HTTPS transfers

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Well-known CA bundle locations across distributions
const SYSTEM_BUNDLES: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt",
    "/etc/pki/tls/certs/ca-bundle.crt",
    "/etc/pki/ca-trust/extracted/pem/tls-ca-bundle.pem",
    "/etc/ssl/ca-bundle.pem",
    "/etc/ssl/cert.pem",
    "/usr/local/etc/openssl/cert.pem",
    "/opt/homebrew/etc/openssl@3/cert.pem",
];

/// A PEM bundle holding at least one certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustStore {
    bundle: PathBuf,
    certificates: usize,
}

impl TrustStore {
    /// Load a PEM bundle, rejecting files without certificates
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|e| {
            Error::TrustMaterial(format!("failed to read CA bundle {}: {}", path.display(), e))
        })?;
        let certs = rustls_pemfile::certs(&mut pem.as_slice())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                Error::TrustMaterial(format!(
                    "failed to parse PEM certs from {}: {}",
                    path.display(),
                    e
                ))
            })?;

        if certs.is_empty() {
            return Err(Error::TrustMaterial(format!(
                "no certificates found in {}",
                path.display()
            )));
        }

        Ok(Self {
            bundle: path.to_path_buf(),
            certificates: certs.len(),
        })
    }

    /// Find a usable bundle: `SSL_CERT_FILE` first, then system locations
    pub fn discover() -> Result<Self> {
        let candidates = std::env::var_os("SSL_CERT_FILE")
            .map(PathBuf::from)
            .into_iter()
            .chain(SYSTEM_BUNDLES.iter().map(PathBuf::from));

        for candidate in candidates {
            if !candidate.is_file() {
                continue;
            }
            match Self::from_pem_file(&candidate) {
                Ok(store) => return Ok(store),
                Err(e) => debug!("Skipping CA bundle {:?}: {}", candidate, e),
            }
        }

        Err(Error::TrustMaterial(
            "no CA bundle found; set SSL_CERT_FILE or pass --ca-bundle".to_string(),
        ))
    }

    /// Path of the PEM bundle
    pub fn bundle_path(&self) -> &Path {
        &self.bundle
    }

    /// Number of certificates in the bundle
    pub fn len(&self) -> usize {
        self.certificates
    }

    /// Always false for a loaded store
    pub fn is_empty(&self) -> bool {
        self.certificates == 0
    }
}
