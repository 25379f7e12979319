//! gridscope-metrics — aggregation and snapshot assembly.
//!
//! Takes the record collections the upstream layer fetched and turns
//! them into the metrics document one run publishes.
//!
//! # Architecture
//!
//! ```text
//! Vec<Node>  (one registry query's records)
//!   └── aggregate patterns (distinct / conditional / threshold / presence)
//!        ├── CategoryAggregate values, committed per category
//!        └── GlobalAggregate — explicit run-wide union accumulator
//!             └── MetricsSnapshot — ordered flat document, fixed key
//!                 convention, type + @timestamp envelope
//! ```
//!
//! Aggregates never fail: a record that cannot contribute is reported
//! through the diagnostic sink and skipped. The snapshot is assembled
//! incrementally — each category's keys are inserted as soon as that
//! category is aggregated, so a later upstream failure leaves earlier
//! results intact.

pub mod aggregate;
pub mod snapshot;

pub use aggregate::{
    ContextSpec, DistinctSet, GlobalAggregate, conditional_count, distinct_field,
    presence_count, threshold_distinct,
};
pub use snapshot::{MetricValue, MetricsSnapshot, count_key, list_key, total_key, union_list_key};
