//! TLS options for the registry client.
//!
//! The registry speaks HTTPS with grid-infrastructure certificates: the
//! server certificate may need validating against a site-local trust
//! anchor, and the private endpoints require a client certificate.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::TlsError;

/// Server-certificate verification mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsVerify {
    /// Verify against the system trust roots.
    Enabled,
    /// Skip verification entirely.
    Disabled,
    /// Verify against a PEM bundle of trust anchors.
    CaBundle(PathBuf),
}

impl TlsVerify {
    /// Parse the operator-facing tri-state: `true`, `false`, or a path
    /// to a trust-anchor bundle.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" | "True" => TlsVerify::Enabled,
            "false" | "False" => TlsVerify::Disabled,
            path => TlsVerify::CaBundle(PathBuf::from(path)),
        }
    }
}

/// Client certificate and key for the registry's private scope.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub certificate: PathBuf,
    pub key: PathBuf,
}

impl ClientIdentity {
    pub fn new(certificate: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        Self {
            certificate: certificate.into(),
            key: key.into(),
        }
    }
}

/// Build a blocking HTTP client from the TLS options.
pub fn build_client(
    verify: &TlsVerify,
    identity: Option<&ClientIdentity>,
    timeout: Duration,
) -> Result<reqwest::blocking::Client, TlsError> {
    let mut builder = reqwest::blocking::Client::builder().timeout(timeout);

    match verify {
        TlsVerify::Enabled => {}
        TlsVerify::Disabled => {
            builder = builder.danger_accept_invalid_certs(true);
        }
        TlsVerify::CaBundle(path) => {
            let pem = read(path)?;
            let certs = reqwest::Certificate::from_pem_bundle(&pem)
                .map_err(|e| TlsError::Pem(e.to_string()))?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }
    }

    if let Some(identity) = identity {
        // reqwest wants one PEM blob holding both halves.
        let mut pem = read(&identity.certificate)?;
        pem.extend_from_slice(&read(&identity.key)?);
        let identity =
            reqwest::Identity::from_pem(&pem).map_err(|e| TlsError::Pem(e.to_string()))?;
        builder = builder.identity(identity);
    }

    builder.build().map_err(|e| TlsError::Build(e.to_string()))
}

fn read(path: &Path) -> Result<Vec<u8>, TlsError> {
    fs::read(path).map_err(|source| TlsError::Read {
        path: path.display().to_string(),
        source,
    })
}
