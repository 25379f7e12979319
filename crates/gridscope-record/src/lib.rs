//! gridscope-record — the record layer for gridscope.
//!
//! Upstream registry endpoints answer with XML documents holding one
//! element per logical record (a site, a user, a service endpoint).
//! This crate parses those documents into owned [`Node`] trees, collects
//! the record elements for a query, and provides the defensive field
//! extractor the aggregation layer is built on.
//!
//! # Architecture
//!
//! ```text
//! XML text
//!   └── parse_document() → Node tree
//!        └── collect_records(tag) → Vec<Node>   (one per record)
//!             └── extract(field) → Extraction::{Value, Missing}
//! ```
//!
//! A missing field is expected for sparse upstream data: `extract` reports
//! it through the injected [`DiagnosticSink`] and returns
//! [`Extraction::Missing`] rather than failing the record or the run.

pub mod diag;
pub mod error;
pub mod extract;
pub mod node;

pub use diag::{DiagnosticSink, MemorySink, Severity, TracingSink};
pub use error::XmlError;
pub use extract::{Extraction, extract};
pub use node::{Node, collect_records, parse_document};
