//! Elasticsearch metrics-store client.
//!
//! Metrics documents and the service logs they are derived from live in
//! daily `logstash-*` indices. The store is probed exactly once per run;
//! a run that finds it unavailable omits every store-sourced aggregate
//! and never attempts to publish.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use gridscope_metrics::MetricsSnapshot;

use crate::error::StoreError;
use crate::query::{StoreQuery, distinct_clients_body, read_distinct_clients};

/// Production store endpoint.
pub const DEFAULT_STORE_URL: &str = "http://elasticsearch2.gridpp.rl.ac.uk:9200";

/// Metrics documents are published under this index prefix, one index
/// per day.
const PUBLISH_INDEX_PREFIX: &str = "logstash-gridtools-metrics-";
const PUBLISH_DOC_TYPE: &str = "metric_data";

// The distinct-clients aggregation scans a whole day of load-balancer
// logs; give it room.
const STORE_TIMEOUT: Duration = Duration::from_secs(300);

/// Single-probe reachability classification of a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    pub fn is_available(self) -> bool {
        self == Availability::Available
    }
}

/// A collaborator wrapping the metrics store.
pub trait MetricsStore {
    /// Lightweight existence probe. A success status classifies the
    /// store available; any other status or a connection failure
    /// classifies it unavailable.
    fn probe(&self) -> Availability;

    /// One integer for one query specification.
    fn count(&self, query: &StoreQuery) -> Result<u64, StoreError>;

    /// Distinct load-balancer client addresses seen on one day.
    fn distinct_clients(&self, date: &str) -> Result<Vec<String>, StoreError>;

    /// Write a snapshot document, indexed by the run date. Duplicate
    /// publishes for the same day are last-write-wins upstream.
    fn publish(&self, snapshot: &MetricsSnapshot, date: &str) -> Result<(), StoreError>;
}

/// Blocking HTTP implementation of [`MetricsStore`].
pub struct EsStore {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl EsStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self, StoreError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(STORE_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Connect(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn search(&self, index: &str, body: &Value) -> Result<Value, StoreError> {
        let url = format!("{}/{index}/_search", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status.as_u16()));
        }
        response
            .json::<Value>()
            .map_err(|e| StoreError::Body(e.to_string()))
    }
}

impl MetricsStore for EsStore {
    fn probe(&self) -> Availability {
        match self.http.get(&self.base_url).send() {
            Ok(response) if response.status().is_success() => Availability::Available,
            Ok(response) => {
                warn!(status = %response.status(), "metrics store probe non-success");
                Availability::Unavailable
            }
            Err(e) => {
                warn!(error = %e, "metrics store probe failed");
                Availability::Unavailable
            }
        }
    }

    fn count(&self, query: &StoreQuery) -> Result<u64, StoreError> {
        let response = self.search(&query.index(), &query.body())?;
        query.read_count(&response)
    }

    fn distinct_clients(&self, date: &str) -> Result<Vec<String>, StoreError> {
        let index = format!("logstash-{date}");
        let response = self.search(&index, &distinct_clients_body())?;
        read_distinct_clients(&response)
    }

    fn publish(&self, snapshot: &MetricsSnapshot, date: &str) -> Result<(), StoreError> {
        let url = format!(
            "{}/{PUBLISH_INDEX_PREFIX}{date}/{PUBLISH_DOC_TYPE}/",
            self.base_url
        );
        let response = self
            .http
            .post(&url)
            .json(snapshot)
            .send()
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status.as_u16()));
        }
        debug!(%date, entries = snapshot.len(), "snapshot published");
        Ok(())
    }
}
