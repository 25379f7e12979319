//! Defensive field extraction.
//!
//! Field names are tag names: callers pass them upper-cased, matching is
//! exact-string. A lookup that finds nothing (or finds only whitespace)
//! is [`Extraction::Missing`] — reported once through the sink, never an
//! error. Aggregation of sibling fields and sibling records proceeds
//! regardless.

use crate::diag::{DiagnosticSink, Severity};
use crate::node::Node;

/// Outcome of one field extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The field was present with non-empty text, surrounding whitespace
    /// trimmed.
    Value(String),
    /// The field was absent or had no text content.
    Missing,
}

impl Extraction {
    /// The extracted text, if any.
    pub fn value(self) -> Option<String> {
        match self {
            Extraction::Value(text) => Some(text),
            Extraction::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Extraction::Missing)
    }
}

/// Extract the named field from a record.
///
/// Selects the first element with the given tag in document order (stable
/// when the tag repeats), trims its text, and returns it as
/// [`Extraction::Value`]. When the field is absent or empty, emits one
/// warning carrying the field name and the record's context string (a
/// portal URL or a query label) and returns [`Extraction::Missing`].
pub fn extract(
    record: &Node,
    field: &str,
    context: &str,
    sink: &dyn DiagnosticSink,
) -> Extraction {
    let text = record
        .descendant(field)
        .map(|node| node.text().trim())
        .unwrap_or_default();

    if text.is_empty() {
        sink.emit(
            Severity::Warn,
            &format!("no {field} in record from {context}"),
        );
        return Extraction::Missing;
    }

    Extraction::Value(text.to_string())
}
