//! GOCDB registry client.

use std::time::Duration;

use tracing::debug;

use gridscope_record::{Node, collect_records};

use crate::error::{FetchError, TlsError};
use crate::query::RegistryQuery;
use crate::tls::{ClientIdentity, TlsVerify, build_client};

/// Production registry endpoint.
pub const DEFAULT_REGISTRY_URL: &str = "https://goc.egi.eu/gocdbpi";

const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// A collaborator answering registry queries with record collections.
pub trait RecordSource {
    fn fetch(&self, query: &RegistryQuery) -> Result<Vec<Node>, FetchError>;
}

/// Blocking HTTP implementation of [`RecordSource`] against the GOCDB
/// programmatic interface.
pub struct RegistryClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl RegistryClient {
    /// Build a client for a registry base URL with the given TLS mode
    /// and optional client identity (needed for private-scope queries).
    pub fn new(
        base_url: impl Into<String>,
        verify: &TlsVerify,
        identity: Option<&ClientIdentity>,
    ) -> Result<Self, TlsError> {
        Ok(Self {
            http: build_client(verify, identity, FETCH_TIMEOUT)?,
            base_url: base_url.into(),
        })
    }
}

impl RecordSource for RegistryClient {
    fn fetch(&self, query: &RegistryQuery) -> Result<Vec<Node>, FetchError> {
        let url = query.url(&self.base_url);
        debug!(%url, "fetching registry records");

        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| FetchError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| FetchError::Connect(e.to_string()))?;
        let records = collect_records(&body, query.record_tag())?;
        debug!(records = records.len(), method = query.method(), "registry records fetched");
        Ok(records)
    }
}
