//! gridscope-run — the per-family metric collection pipelines.
//!
//! One run collects one metrics family: either the registry-derived
//! GOCDB family or the accounting-derived APEL family. A run is
//! strictly sequential — fetch a category, aggregate it, commit its
//! keys to the snapshot, move on — so whatever a failing upstream
//! interrupts, everything already committed survives into the output.
//!
//! # Degraded modes
//!
//! * Registry connection failure: the remaining not-yet-attempted
//!   categories are skipped for the run; committed categories stay.
//! * Registry non-success status / unusable body: only the category at
//!   hand is skipped.
//! * Store probe unavailable: every store-sourced key is omitted (not
//!   zeroed) and publishing is skipped outright.
//!
//! No failure propagates out of a run; the snapshot is always returned
//! for delivery or inspection.

pub mod apel;
pub mod dates;
pub mod gocdb;
pub mod outcome;

#[cfg(test)]
pub(crate) mod testutil;

pub use apel::{ACCOUNTING_QUERY_TYPES, ENDPOINT_TYPES, run_apel};
pub use dates::{daily_dates_back, yesterday};
pub use gocdb::run_gocdb;
pub use outcome::{RunOutcome, deliver};

use gridscope_record::Node;
use gridscope_upstream::{FetchError, RecordSource, RegistryQuery};
use tracing::error;

/// Fetch one category's records, tracking registry availability.
///
/// A connection-level failure flips `registry_up` so callers stop
/// attempting further categories; any other failure skips just this
/// category. Both paths log and return `None`.
fn fetch_category(
    registry: &dyn RecordSource,
    query: &RegistryQuery,
    registry_up: &mut bool,
) -> Option<Vec<Node>> {
    if !*registry_up {
        return None;
    }
    match registry.fetch(query) {
        Ok(records) => Some(records),
        Err(FetchError::Connect(e)) => {
            error!(
                error = %e,
                method = query.method(),
                "registry unreachable, remaining categories skipped"
            );
            *registry_up = false;
            None
        }
        Err(e) => {
            error!(
                error = %e,
                method = query.method(),
                "registry query failed, category skipped"
            );
            None
        }
    }
}
