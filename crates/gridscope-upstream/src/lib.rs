//! gridscope-upstream — the external collaborators behind the pipeline.
//!
//! Two upstream dependencies exist: the GOCDB registry (XML over HTTPS)
//! and the Elasticsearch metrics store (JSON over HTTP). Each is reached
//! through a trait seam so the run pipelines can be exercised against
//! in-memory doubles:
//!
//! ```text
//! RecordSource ── RegistryClient    (blocking reqwest, TLS modes,
//!   │                                optional client identity)
//!   └── fetch(RegistryQuery) → Vec<Node> | FetchError
//!
//! MetricsStore ── EsStore           (daily logstash-* indices)
//!   ├── probe() → Availability      (single GET, 200 = available)
//!   ├── count(StoreQuery) → u64
//!   ├── distinct_clients(date) → Vec<String>
//!   └── publish(MetricsSnapshot, date)
//! ```
//!
//! `FetchError::Connect` is the registry's unavailability signal: the
//! run treats it as "stop fetching further categories", while any other
//! fetch error fails only the category at hand.

pub mod error;
pub mod query;
pub mod registry;
pub mod store;
pub mod tls;

pub use error::{FetchError, StoreError, TlsError};
pub use query::{RegistryQuery, StoreQuery};
pub use registry::{RecordSource, RegistryClient, DEFAULT_REGISTRY_URL};
pub use store::{Availability, EsStore, MetricsStore, DEFAULT_STORE_URL};
pub use tls::{ClientIdentity, TlsVerify};
