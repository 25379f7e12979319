//! Query specifications for both upstreams.
//!
//! A [`RegistryQuery`] knows its GOCDB method path and which element tag
//! marks one record in the response. A [`StoreQuery`] knows its daily
//! index and its Elasticsearch request body, and how to read the single
//! integer out of the response.

use serde_json::{Value, json};

use crate::error::StoreError;

/// One logical registry query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryQuery {
    /// All registered sites (`get_site_list`).
    SiteList,
    /// Per-country site counts (`get_site_count_per_country`).
    SiteCountPerCountry,
    /// All registered users (`get_user`, private scope).
    Users,
    /// Service endpoints of one type (`get_service_endpoint`).
    ServiceEndpoints { service_type: String },
}

impl RegistryQuery {
    /// The GOCDB PI method name.
    pub fn method(&self) -> &'static str {
        match self {
            RegistryQuery::SiteList => "get_site_list",
            RegistryQuery::SiteCountPerCountry => "get_site_count_per_country",
            RegistryQuery::Users => "get_user",
            RegistryQuery::ServiceEndpoints { .. } => "get_service_endpoint",
        }
    }

    /// The element tag holding one record in the response.
    pub fn record_tag(&self) -> &'static str {
        match self {
            RegistryQuery::SiteList | RegistryQuery::SiteCountPerCountry => "SITE",
            RegistryQuery::Users => "EGEE_USER",
            RegistryQuery::ServiceEndpoints { .. } => "SERVICE_ENDPOINT",
        }
    }

    /// User data needs the private, certificate-authenticated scope.
    pub fn is_private(&self) -> bool {
        matches!(self, RegistryQuery::Users)
    }

    /// Full request URL under a registry base URL.
    pub fn url(&self, base: &str) -> String {
        let scope = if self.is_private() { "private" } else { "public" };
        let mut url = format!("{base}/{scope}/?method={}", self.method());
        if let RegistryQuery::ServiceEndpoints { service_type } = self {
            url.push_str("&service_type=");
            url.push_str(service_type);
        }
        url
    }

    /// Fallback diagnostic label for records from this query.
    pub fn label(&self) -> &'static str {
        self.method()
    }
}

/// One integer-valued metrics-store query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreQuery {
    /// Number of registry API queries (endpoint names starting with
    /// `get_`) on one day.
    ApiQueries { date: String },
    /// Sum of records the accounting loader ingested for one query type
    /// on one day.
    RecordsLoaded { query_type: String, date: String },
}

impl StoreQuery {
    /// The daily index this query runs against.
    pub fn index(&self) -> String {
        let date = match self {
            StoreQuery::ApiQueries { date } => date,
            StoreQuery::RecordsLoaded { date, .. } => date,
        };
        format!("logstash-{date}")
    }

    /// The Elasticsearch request body.
    pub fn body(&self) -> Value {
        match self {
            StoreQuery::ApiQueries { .. } => json!({
                "query": {
                    "bool": {
                        "must": [
                            { "match": { "type": "gocdb" } },
                            { "match": { "fields.service_level": "prod" } },
                            { "prefix": { "endpoint": "get_" } }
                        ]
                    }
                },
                "size": 0
            }),
            StoreQuery::RecordsLoaded { query_type, .. } => json!({
                "query": {
                    "bool": {
                        "must": [
                            { "match": { "fields.apel_type": query_type } },
                            { "match": { "fields.process": "loader" } }
                        ]
                    }
                },
                "size": 0,
                "aggs": {
                    "total_number_loaded": { "sum": { "field": "numberloaded" } }
                }
            }),
        }
    }

    /// Pull this query's integer out of a search response.
    pub fn read_count(&self, response: &Value) -> Result<u64, StoreError> {
        match self {
            StoreQuery::ApiQueries { .. } => read_hits_total(response),
            StoreQuery::RecordsLoaded { .. } => response
                .pointer("/aggregations/total_number_loaded/value")
                .and_then(Value::as_f64)
                .map(|v| v as u64)
                .ok_or_else(|| StoreError::Body("missing total_number_loaded".into())),
        }
    }
}

/// `hits.total` is a bare number on old clusters and `{"value": n}` on
/// newer ones; accept both.
fn read_hits_total(response: &Value) -> Result<u64, StoreError> {
    let total = response
        .pointer("/hits/total")
        .ok_or_else(|| StoreError::Body("missing hits.total".into()))?;
    total
        .as_u64()
        .or_else(|| total.pointer("/value").and_then(Value::as_u64))
        .ok_or_else(|| StoreError::Body("unreadable hits.total".into()))
}

/// Terms aggregation over distinct load-balancer client IPs on one day.
///
/// Aggregations have no pagination on the clusters in service, so the
/// bucket size is set an order of magnitude above the expected result.
pub fn distinct_clients_body() -> Value {
    json!({
        "query": {
            "bool": {
                "must": [
                    { "match": { "backend_name": "gocdb-prod" } }
                ]
            }
        },
        "aggs": {
            "clients": {
                "terms": {
                    // client_ip.raw keeps the address whole; the analyzed
                    // field tokenizes A.B.C.D into its octets.
                    "field": "client_ip.raw",
                    "size": 20000
                }
            }
        },
        "size": 0
    })
}

/// Pull the bucket keys out of a distinct-clients response.
pub fn read_distinct_clients(response: &Value) -> Result<Vec<String>, StoreError> {
    let buckets = response
        .pointer("/aggregations/clients/buckets")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::Body("missing clients buckets".into()))?;
    Ok(buckets
        .iter()
        .filter_map(|b| b.get("key").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_urls() {
        let base = "https://goc.egi.eu/gocdbpi";
        assert_eq!(
            RegistryQuery::SiteList.url(base),
            "https://goc.egi.eu/gocdbpi/public/?method=get_site_list"
        );
        assert_eq!(
            RegistryQuery::Users.url(base),
            "https://goc.egi.eu/gocdbpi/private/?method=get_user"
        );
        assert_eq!(
            RegistryQuery::ServiceEndpoints {
                service_type: "gLite-APEL".to_string()
            }
            .url(base),
            "https://goc.egi.eu/gocdbpi/public/?method=get_service_endpoint&service_type=gLite-APEL"
        );
    }

    #[test]
    fn record_tags_match_queries() {
        assert_eq!(RegistryQuery::SiteList.record_tag(), "SITE");
        assert_eq!(RegistryQuery::SiteCountPerCountry.record_tag(), "SITE");
        assert_eq!(RegistryQuery::Users.record_tag(), "EGEE_USER");
        assert_eq!(
            RegistryQuery::ServiceEndpoints {
                service_type: "APEL".to_string()
            }
            .record_tag(),
            "SERVICE_ENDPOINT"
        );
    }

    #[test]
    fn only_users_is_private() {
        assert!(RegistryQuery::Users.is_private());
        assert!(!RegistryQuery::SiteList.is_private());
    }

    #[test]
    fn store_query_daily_index() {
        let q = StoreQuery::ApiQueries {
            date: "2018.07.06".to_string(),
        };
        assert_eq!(q.index(), "logstash-2018.07.06");
    }

    #[test]
    fn records_loaded_body_sums_numberloaded() {
        let q = StoreQuery::RecordsLoaded {
            query_type: "cloud".to_string(),
            date: "2018.07.06".to_string(),
        };
        let body = q.body();
        assert_eq!(body["size"], 0);
        assert_eq!(
            body["aggs"]["total_number_loaded"]["sum"]["field"],
            "numberloaded"
        );
        assert_eq!(
            body["query"]["bool"]["must"][0]["match"]["fields.apel_type"],
            "cloud"
        );
    }

    #[test]
    fn api_queries_body_filters_get_prefix() {
        let q = StoreQuery::ApiQueries {
            date: "2018.07.06".to_string(),
        };
        let body = q.body();
        assert_eq!(body["query"]["bool"]["must"][2]["prefix"]["endpoint"], "get_");
    }

    #[test]
    fn read_count_accepts_both_hits_total_shapes() {
        let q = StoreQuery::ApiQueries {
            date: "d".to_string(),
        };
        let old = json!({ "hits": { "total": 42 } });
        let new = json!({ "hits": { "total": { "value": 42 } } });
        assert_eq!(q.read_count(&old).unwrap(), 42);
        assert_eq!(q.read_count(&new).unwrap(), 42);
    }

    #[test]
    fn read_count_reads_sum_aggregation() {
        let q = StoreQuery::RecordsLoaded {
            query_type: "grid".to_string(),
            date: "d".to_string(),
        };
        let response = json!({
            "aggregations": { "total_number_loaded": { "value": 12345.0 } }
        });
        assert_eq!(q.read_count(&response).unwrap(), 12345);
    }

    #[test]
    fn read_count_rejects_unexpected_shape() {
        let q = StoreQuery::ApiQueries {
            date: "d".to_string(),
        };
        assert!(q.read_count(&json!({})).is_err());
    }

    #[test]
    fn distinct_clients_buckets() {
        let response = json!({
            "aggregations": { "clients": { "buckets": [
                { "key": "10.0.0.1", "doc_count": 12 },
                { "key": "10.0.0.2", "doc_count": 3 }
            ] } }
        });
        assert_eq!(
            read_distinct_clients(&response).unwrap(),
            vec!["10.0.0.1", "10.0.0.2"]
        );
    }
}
