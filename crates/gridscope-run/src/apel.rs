//! The accounting-derived (APEL) metrics family.
//!
//! One category per accounting service-endpoint type. Each category is
//! fetched, aggregated, and committed independently; the run-wide
//! country union is rewritten after every category so even a partial
//! run carries a consistent union.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use gridscope_metrics::{
    ContextSpec, GlobalAggregate, MetricsSnapshot, conditional_count, count_key, distinct_field,
};
use gridscope_record::DiagnosticSink;
use gridscope_upstream::{MetricsStore, RecordSource, RegistryQuery, StoreQuery};

use crate::dates::yesterday;
use crate::fetch_category;
use crate::outcome::RunOutcome;

/// Accounting service-endpoint types, one metrics category each.
pub const ENDPOINT_TYPES: [&str; 4] = [
    "gLite-APEL",
    "APEL",
    "eu.egi.cloud.accounting",
    "eu.egi.storage.accounting",
];

/// Accounting record streams whose loader totals are store-sourced.
pub const ACCOUNTING_QUERY_TYPES: [&str; 3] = ["storage", "cloud", "grid"];

/// Collect the APEL metrics family into one snapshot.
pub fn run_apel(
    registry: &dyn RecordSource,
    store: &dyn MetricsStore,
    sink: &dyn DiagnosticSink,
    now: DateTime<Utc>,
) -> RunOutcome {
    info!("accounting metrics run started");
    let mut snapshot = MetricsSnapshot::new("apel_metric", now.to_rfc3339());
    let mut all_countries = GlobalAggregate::new();
    let mut registry_up = true;

    for endpoint in ENDPOINT_TYPES {
        let query = RegistryQuery::ServiceEndpoints {
            service_type: endpoint.to_string(),
        };
        let Some(records) = fetch_category(registry, &query, &mut registry_up) else {
            if !registry_up {
                break;
            }
            continue;
        };

        let ctx = ContextSpec::field("GOCDB_PORTAL_URL", query.label());

        let sites = distinct_field(&records, "SITENAME", ctx, sink);
        snapshot.insert_distinct(
            &format!("sites running at least one {endpoint} endpoint"),
            &sites,
        );

        let endpoints = conditional_count(&records, "SERVICE_TYPE", endpoint, "HOSTDN", ctx, sink);
        snapshot.insert_count(count_key(&format!("{endpoint} endpoints")), endpoints);

        let countries = distinct_field(&records, "COUNTRY_NAME", ctx, sink);
        snapshot.insert_distinct(
            &format!("countries with at least one {endpoint} endpoint"),
            &countries,
        );

        // Fold this category into the union and rewrite the union keys,
        // so a later category's failure still leaves them consistent.
        all_countries.absorb(&countries);
        snapshot.insert_union("countries using APEL", all_countries.as_set());
    }

    let store_status = store.probe();
    if store_status.is_available() {
        let date = yesterday(now);
        for query_type in ACCOUNTING_QUERY_TYPES {
            let query = StoreQuery::RecordsLoaded {
                query_type: query_type.to_string(),
                date: date.clone(),
            };
            match store.count(&query) {
                Ok(total) => snapshot.insert_count(
                    count_key(&format!("records loaded for {query_type} accounting")),
                    total,
                ),
                Err(e) => {
                    warn!(error = %e, %query_type, "records-loaded query failed, key omitted");
                }
            }
        }
    } else {
        warn!("metrics store unavailable, store-sourced metrics omitted for this run");
    }

    info!(entries = snapshot.len(), "accounting metrics run finished");
    RunOutcome {
        snapshot,
        store: store_status,
    }
}
