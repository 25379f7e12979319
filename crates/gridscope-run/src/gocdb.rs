//! The registry-derived (GOCDB) metrics family.
//!
//! Three registry categories — sites, countries with at least one site,
//! users — fetched and committed in sequence, then the store-sourced
//! usage metrics behind the availability gate: yesterday's API query
//! count and the distinct client addresses over the last 28 days.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use gridscope_metrics::{
    ContextSpec, DistinctSet, MetricsSnapshot, count_key, presence_count, threshold_distinct,
};
use gridscope_record::DiagnosticSink;
use gridscope_upstream::{MetricsStore, RecordSource, RegistryQuery, StoreQuery};

use crate::dates::{daily_dates_back, yesterday};
use crate::fetch_category;
use crate::outcome::RunOutcome;

/// Window for the distinct-clients metric, today excluded.
const CLIENT_WINDOW_DAYS: u32 = 28;

/// Collect the GOCDB metrics family into one snapshot.
pub fn run_gocdb(
    registry: &dyn RecordSource,
    store: &dyn MetricsStore,
    sink: &dyn DiagnosticSink,
    now: DateTime<Utc>,
) -> RunOutcome {
    info!("registry metrics run started");
    let mut snapshot = MetricsSnapshot::new("gocdb_metric", now.to_rfc3339());
    let mut registry_up = true;

    // Sites — every registered service provider counts.
    if let Some(records) = fetch_category(registry, &RegistryQuery::SiteList, &mut registry_up) {
        snapshot.insert_count(count_key("sites in GOCDB"), records.len() as u64);
    }

    // Countries — only those with at least one site.
    if let Some(records) =
        fetch_category(registry, &RegistryQuery::SiteCountPerCountry, &mut registry_up)
    {
        let query = RegistryQuery::SiteCountPerCountry;
        let countries = threshold_distinct(
            &records,
            "COUNTRY",
            "COUNT",
            ContextSpec::label(query.label()),
            sink,
        );
        snapshot.insert_distinct("countries using GOCDB", &countries);
    }

    // Users — total, and how many hold at least one role.
    if let Some(records) = fetch_category(registry, &RegistryQuery::Users, &mut registry_up) {
        snapshot.insert_count(count_key("registered GOCDB users"), records.len() as u64);
        // Each user appears once in the response, possibly with several
        // role blocks; a user with any role block counts once.
        snapshot.insert_count(
            count_key("registered GOCDB users with a role"),
            presence_count(&records, "USER_ROLE"),
        );
    }

    let store_status = store.probe();
    if store_status.is_available() {
        let date = yesterday(now);
        match store.count(&StoreQuery::ApiQueries { date }) {
            Ok(queries) => snapshot.insert_count(count_key("GOCDB API queries"), queries),
            Err(e) => warn!(error = %e, "api-queries count failed, key omitted"),
        }

        commit_distinct_clients(store, &mut snapshot, now);
    } else {
        warn!("metrics store unavailable, store-sourced metrics omitted for this run");
    }

    info!(entries = snapshot.len(), "registry metrics run finished");
    RunOutcome {
        snapshot,
        store: store_status,
    }
}

/// Union the per-day distinct client addresses over the window and
/// commit the cardinality. A failing day omits the key rather than
/// reporting an undercount.
fn commit_distinct_clients(
    store: &dyn MetricsStore,
    snapshot: &mut MetricsSnapshot,
    now: DateTime<Utc>,
) {
    let mut clients = DistinctSet::new();
    for date in daily_dates_back(now, CLIENT_WINDOW_DAYS) {
        match store.distinct_clients(&date) {
            Ok(addresses) => {
                for address in addresses {
                    clients.insert(address);
                }
            }
            Err(e) => {
                warn!(error = %e, %date, "distinct-clients query failed, key omitted");
                return;
            }
        }
    }
    snapshot.insert_count(count_key("unique IPs accessing GOCDB"), clients.len() as u64);
}
