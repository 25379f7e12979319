//! Error types for the upstream layer.

use thiserror::Error;

/// Errors from a registry fetch.
///
/// Only `Connect` classifies the registry as unavailable for the rest
/// of the run; the other variants fail the current category alone.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure — could not reach the registry at all.
    #[error("registry connection failed: {0}")]
    Connect(String),

    /// The registry answered with a non-success HTTP status.
    #[error("registry returned status {0}")]
    Status(u16),

    /// The response body was not the expected XML.
    #[error("registry response unusable: {0}")]
    Malformed(#[from] gridscope_record::XmlError),
}

/// Errors from a metrics-store query or publish.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connect(String),

    #[error("store returned status {0}")]
    Status(u16),

    /// The store answered, but not in the shape the query expects.
    #[error("store response unusable: {0}")]
    Body(String),
}

/// Errors while building an HTTP client from TLS options.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("unusable pem material: {0}")]
    Pem(String),

    #[error("failed to build http client: {0}")]
    Build(String),
}
