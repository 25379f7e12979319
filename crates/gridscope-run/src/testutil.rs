//! In-memory collaborator doubles for pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};

use gridscope_metrics::MetricsSnapshot;
use gridscope_record::{Node, collect_records};
use gridscope_upstream::{
    Availability, FetchError, MetricsStore, RecordSource, RegistryQuery, StoreError, StoreQuery,
};

/// A fixed run instant: 2018-07-07 12:00 UTC.
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 7, 7, 12, 0, 0).unwrap()
}

/// Canned registry behavior for one query.
pub enum StubFetch {
    /// Answer with the records parsed from this document.
    Xml(&'static str),
    /// Fail at the connection level.
    Connect,
    /// Answer with a non-success status.
    Status(u16),
}

/// Registry double. Unconfigured queries answer an empty record set
/// (a reachable registry with no matching data).
#[derive(Default)]
pub struct StubRegistry {
    responses: HashMap<String, StubFetch>,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: RegistryQuery, response: StubFetch) -> Self {
        self.responses.insert(Self::key(&query), response);
        self
    }

    fn key(query: &RegistryQuery) -> String {
        match query {
            RegistryQuery::ServiceEndpoints { service_type } => {
                format!("get_service_endpoint:{service_type}")
            }
            other => other.method().to_string(),
        }
    }
}

impl RecordSource for StubRegistry {
    fn fetch(&self, query: &RegistryQuery) -> Result<Vec<Node>, FetchError> {
        match self.responses.get(&Self::key(query)) {
            Some(StubFetch::Xml(xml)) => Ok(collect_records(xml, query.record_tag()).unwrap()),
            Some(StubFetch::Connect) => Err(FetchError::Connect("connection refused".into())),
            Some(StubFetch::Status(status)) => Err(FetchError::Status(*status)),
            None => Ok(Vec::new()),
        }
    }
}

/// Store double. Counts must be configured per query; unknown dates
/// answer an empty client list.
pub struct StubStore {
    available: bool,
    counts: HashMap<String, u64>,
    clients: HashMap<String, Vec<String>>,
    fail_publish: bool,
    published: Mutex<Vec<(MetricsSnapshot, String)>>,
}

impl StubStore {
    pub fn up() -> Self {
        Self {
            available: true,
            counts: HashMap::new(),
            clients: HashMap::new(),
            fail_publish: false,
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn down() -> Self {
        Self {
            available: false,
            ..Self::up()
        }
    }

    pub fn failing_publish(mut self) -> Self {
        self.fail_publish = true;
        self
    }

    pub fn with_count(mut self, query: StoreQuery, count: u64) -> Self {
        self.counts.insert(Self::key(&query), count);
        self
    }

    pub fn with_clients(mut self, date: &str, clients: &[&str]) -> Self {
        self.clients
            .insert(date.to_string(), clients.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Everything published so far, with its index date.
    pub fn published(&self) -> Vec<(MetricsSnapshot, String)> {
        self.published.lock().expect("stub lock").clone()
    }

    fn key(query: &StoreQuery) -> String {
        match query {
            StoreQuery::ApiQueries { date } => format!("api:{date}"),
            StoreQuery::RecordsLoaded { query_type, date } => {
                format!("loaded:{query_type}:{date}")
            }
        }
    }
}

impl MetricsStore for StubStore {
    fn probe(&self) -> Availability {
        if self.available {
            Availability::Available
        } else {
            Availability::Unavailable
        }
    }

    fn count(&self, query: &StoreQuery) -> Result<u64, StoreError> {
        self.counts
            .get(&Self::key(query))
            .copied()
            .ok_or(StoreError::Status(404))
    }

    fn distinct_clients(&self, date: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.clients.get(date).cloned().unwrap_or_default())
    }

    fn publish(&self, snapshot: &MetricsSnapshot, date: &str) -> Result<(), StoreError> {
        if self.fail_publish {
            return Err(StoreError::Status(503));
        }
        self.published
            .lock()
            .expect("stub lock")
            .push((snapshot.clone(), date.to_string()));
        Ok(())
    }
}
