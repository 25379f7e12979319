//! Run outcome and snapshot delivery.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use gridscope_metrics::MetricsSnapshot;
use gridscope_upstream::{Availability, MetricsStore};

use crate::dates::yesterday;

/// What one run produced: the (possibly partial) snapshot, plus the
/// store classification made at the gate — delivery consults it so a
/// known-unavailable store is never written to.
#[derive(Debug)]
pub struct RunOutcome {
    pub snapshot: MetricsSnapshot,
    pub store: Availability,
}

/// Publish the snapshot when asked to and the store allows it.
///
/// Returns whether the snapshot was published. A publish failure is
/// logged and swallowed — the caller still has the snapshot to render.
/// When publishing is off the caller renders the snapshot instead.
pub fn deliver(
    store: &dyn MetricsStore,
    outcome: &RunOutcome,
    publish: bool,
    now: DateTime<Utc>,
) -> bool {
    if !publish {
        return false;
    }
    if !outcome.store.is_available() {
        warn!("publish requested but the metrics store is unavailable, skipping");
        return false;
    }
    let date = yesterday(now);
    match store.publish(&outcome.snapshot, &date) {
        Ok(()) => {
            info!(%date, doc_type = outcome.snapshot.doc_type(), "snapshot published");
            true
        }
        Err(e) => {
            error!(error = %e, "snapshot publish failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{StubStore, noon};

    fn outcome(store: Availability) -> RunOutcome {
        RunOutcome {
            snapshot: MetricsSnapshot::new("apel_metric", "t"),
            store,
        }
    }

    #[test]
    fn publish_disabled_never_touches_the_store() {
        let store = StubStore::up();
        assert!(!deliver(&store, &outcome(Availability::Available), false, noon()));
        assert!(store.published().is_empty());
    }

    #[test]
    fn unavailable_store_is_never_published_to() {
        let store = StubStore::down();
        assert!(!deliver(&store, &outcome(Availability::Unavailable), true, noon()));
        assert!(store.published().is_empty());
    }

    #[test]
    fn publishes_under_yesterdays_date() {
        let store = StubStore::up();
        assert!(deliver(&store, &outcome(Availability::Available), true, noon()));
        let published = store.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].1, "2018.07.06");
    }

    #[test]
    fn publish_failure_is_swallowed() {
        let store = StubStore::up().failing_publish();
        assert!(!deliver(&store, &outcome(Availability::Available), true, noon()));
    }
}
