//! Aggregation patterns over upstream record collections.
//!
//! Three extraction patterns cover every metric the registries provide:
//! distinct-list over one field, conditional count gated on a
//! discriminator plus a presence field, and threshold-filtered
//! distinct-list over a name/count pair. A fourth, presence counting,
//! covers the user-role metric. All of them skip-and-report rather than
//! fail: one bad record never aborts its category.

use gridscope_record::{DiagnosticSink, Node, Severity, extract};

/// Insertion-ordered set of distinct string values.
///
/// Membership is exact string equality; order is first occurrence.
/// Cardinalities here are tens of entries (countries, site names), so a
/// vector scan beats a hash set's allocation churn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistinctSet {
    values: Vec<String>,
}

impl DistinctSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value unless already present. Returns whether it was new.
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.values.iter().any(|v| *v == value) {
            return false;
        }
        self.values.push(value);
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in insertion order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.values.clone()
    }
}

/// How to derive the diagnostic context string for a record: the value
/// of a context field (e.g. `GOCDB_PORTAL_URL`) when present, otherwise
/// a fixed label (usually the query name).
#[derive(Debug, Clone, Copy)]
pub struct ContextSpec<'a> {
    pub field: Option<&'a str>,
    pub label: &'a str,
}

impl<'a> ContextSpec<'a> {
    /// Context from a field with a label fallback.
    pub fn field(field: &'a str, label: &'a str) -> Self {
        Self {
            field: Some(field),
            label,
        }
    }

    /// Fixed-label context for records that carry no usable identifier.
    pub fn label(label: &'a str) -> Self {
        Self { field: None, label }
    }

    /// Resolve the context string for one record.
    pub fn of(&self, record: &Node) -> String {
        self.field
            .and_then(|f| record.descendant(f))
            .map(|node| node.text().trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.label.to_string())
    }
}

/// Pattern 1 — distinct-list over one field.
///
/// Extracts `field` from every record and collects the distinct values
/// in first-occurrence order. Records where the field is missing are
/// reported and skipped.
pub fn distinct_field(
    records: &[Node],
    field: &str,
    ctx: ContextSpec<'_>,
    sink: &dyn DiagnosticSink,
) -> DistinctSet {
    let mut set = DistinctSet::new();
    for record in records {
        if let Some(value) = extract(record, field, &ctx.of(record), sink).value() {
            set.insert(value);
        }
    }
    set
}

/// Pattern 2 — conditional count.
///
/// Counts records whose `discr_field` equals `target` and whose
/// `presence_field` extracts successfully. A record missing either
/// field is reported and excluded from the count.
pub fn conditional_count(
    records: &[Node],
    discr_field: &str,
    target: &str,
    presence_field: &str,
    ctx: ContextSpec<'_>,
    sink: &dyn DiagnosticSink,
) -> u64 {
    let mut count = 0;
    for record in records {
        let context = ctx.of(record);
        let Some(discr) = extract(record, discr_field, &context, sink).value() else {
            continue;
        };
        if extract(record, presence_field, &context, sink).is_missing() {
            continue;
        }
        if discr == target {
            count += 1;
        }
    }
    count
}

/// Pattern 3 — threshold-filtered distinct-list.
///
/// Extracts a name and a numeric count per record; the name joins the
/// set only when the count parses and is strictly greater than zero.
/// A present-but-non-numeric count drops that record with an error
/// diagnostic; the remaining records still aggregate.
pub fn threshold_distinct(
    records: &[Node],
    name_field: &str,
    count_field: &str,
    ctx: ContextSpec<'_>,
    sink: &dyn DiagnosticSink,
) -> DistinctSet {
    let mut set = DistinctSet::new();
    for record in records {
        let context = ctx.of(record);
        let Some(name) = extract(record, name_field, &context, sink).value() else {
            continue;
        };
        let Some(raw) = extract(record, count_field, &context, sink).value() else {
            continue;
        };
        let count: i64 = match raw.parse() {
            Ok(n) => n,
            Err(_) => {
                sink.emit(
                    Severity::Error,
                    &format!("malformed {count_field} {raw:?} in record from {context}"),
                );
                continue;
            }
        };
        if count > 0 {
            set.insert(name);
        }
    }
    set
}

/// Pattern 4 — presence count.
///
/// Counts records containing at least one `field` sub-tree. A record
/// may hold several such blocks; it still counts once.
pub fn presence_count(records: &[Node], field: &str) -> u64 {
    records.iter().filter(|r| r.has_descendant(field)).count() as u64
}

/// Run-wide union accumulator, owned by the run in progress.
///
/// Categories are folded in one at a time; duplicates across categories
/// collapse. The accumulator is an explicit value handed through the
/// run, never module state, and starts empty every run.
#[derive(Debug, Clone, Default)]
pub struct GlobalAggregate {
    union: DistinctSet,
}

impl GlobalAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one category's distinct set into the union.
    pub fn absorb(&mut self, category: &DistinctSet) {
        for value in category.values() {
            self.union.insert(value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.union.len()
    }

    pub fn is_empty(&self) -> bool {
        self.union.is_empty()
    }

    pub fn values(&self) -> &[String] {
        self.union.values()
    }

    pub fn as_set(&self) -> &DistinctSet {
        &self.union
    }
}
