//! Injected diagnostic sink.
//!
//! Extraction misses and per-record parse problems are observability,
//! not control flow: the pipeline reports them and carries on. The sink
//! is passed explicitly into every component that emits, so tests can
//! swap the tracing-backed sink for an in-memory one and assert on what
//! was reported.

use std::sync::Mutex;

use tracing::{error, warn};

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Expected sparseness — a record lacked an optional field.
    Warn,
    /// A record carried data that could not be used (e.g. a non-numeric
    /// count); the record was dropped from its aggregate.
    Error,
}

/// Fire-and-forget diagnostic receiver. Implementations never fail.
pub trait DiagnosticSink {
    fn emit(&self, severity: Severity, message: &str);
}

/// Production sink — forwards to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Warn => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }
    }
}

/// Capturing sink for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far, in order.
    pub fn events(&self) -> Vec<(Severity, String)> {
        self.events.lock().expect("sink lock").clone()
    }

    /// Number of events at the given severity.
    pub fn count_at(&self, severity: Severity) -> usize {
        self.events
            .lock()
            .expect("sink lock")
            .iter()
            .filter(|(s, _)| *s == severity)
            .count()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, severity: Severity, message: &str) {
        self.events
            .lock()
            .expect("sink lock")
            .push((severity, message.to_string()));
    }
}
