//! MetricsSnapshot — the flat metrics document one run produces.
//!
//! An ordered mapping from descriptive string keys to values, carrying a
//! `type` discriminator and the ISO-8601 run timestamp captured once at
//! run start. A key whose source dependency was unavailable is entirely
//! absent — never null, never zero — so a consumer can tell "zero
//! records" from "could not be determined".
//!
//! # Key convention
//!
//! Count/list pairs share a subject phrase:
//!
//! ```text
//! Number of {subject}        e.g. Number of countries using GOCDB
//! List of {subject}          e.g. List of countries using GOCDB
//! ```
//!
//! The run-wide union pair uses the `Total`/`Complete` phrasing:
//!
//! ```text
//! Total number of {subject}
//! Complete list of {subject}
//! ```

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::aggregate::DistinctSet;

/// Count key for a subject phrase.
pub fn count_key(subject: &str) -> String {
    format!("Number of {subject}")
}

/// List key for a subject phrase.
pub fn list_key(subject: &str) -> String {
    format!("List of {subject}")
}

/// Count key for the run-wide union.
pub fn total_key(subject: &str) -> String {
    format!("Total number of {subject}")
}

/// List key for the run-wide union.
pub fn union_list_key(subject: &str) -> String {
    format!("Complete list of {subject}")
}

/// One metric value: a count, a scalar string, or an ordered list.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Text(String),
    List(Vec<String>),
}

/// The assembled metrics document.
///
/// Entries keep insertion order; re-inserting an existing key replaces
/// its value in place (the run-wide union keys are rewritten after each
/// category this way).
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    doc_type: String,
    timestamp: String,
    entries: Vec<(String, MetricValue)>,
}

impl MetricsSnapshot {
    /// Start an empty snapshot with its discriminator and run timestamp.
    pub fn new(doc_type: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            timestamp: timestamp.into(),
            entries: Vec::new(),
        }
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Insert or replace a key. Replacement keeps the key's position.
    pub fn insert(&mut self, key: impl Into<String>, value: MetricValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn insert_count(&mut self, key: impl Into<String>, count: u64) {
        self.insert(key, MetricValue::Count(count));
    }

    pub fn insert_list(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.insert(key, MetricValue::List(values));
    }

    /// Commit a distinct-set aggregate as its count/list key pair.
    pub fn insert_distinct(&mut self, subject: &str, set: &DistinctSet) {
        self.insert_count(count_key(subject), set.len() as u64);
        self.insert_list(list_key(subject), set.to_vec());
    }

    /// Commit (or rewrite) the run-wide union as its total/complete pair.
    pub fn insert_union(&mut self, subject: &str, union: &DistinctSet) {
        self.insert_count(total_key(subject), union.len() as u64);
        self.insert_list(union_list_key(subject), union.to_vec());
    }

    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Entry keys in insertion order (envelope fields excluded).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of metric entries (envelope fields excluded).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for MetricsSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len() + 2))?;
        map.serialize_entry("type", &self.doc_type)?;
        map.serialize_entry("@timestamp", &self.timestamp)?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> DistinctSet {
        let mut s = DistinctSet::new();
        for v in values {
            s.insert(*v);
        }
        s
    }

    #[test]
    fn envelope_fields_serialize_first() {
        let mut snap = MetricsSnapshot::new("apel_metric", "2018-07-07T12:00:00+00:00");
        snap.insert_count("Number of APEL endpoints", 3);

        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.starts_with(r#"{"type":"apel_metric","@timestamp":"2018-07-07T12:00:00+00:00""#));
        assert!(json.contains(r#""Number of APEL endpoints":3"#));
    }

    #[test]
    fn entries_serialize_in_insertion_order() {
        let mut snap = MetricsSnapshot::new("gocdb_metric", "t");
        snap.insert_count("b", 1);
        snap.insert_count("a", 2);

        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.find(r#""b""#).unwrap() < json.find(r#""a""#).unwrap());
    }

    #[test]
    fn reinsert_replaces_in_place() {
        let mut snap = MetricsSnapshot::new("apel_metric", "t");
        snap.insert_count("first", 1);
        snap.insert_count("union", 2);
        snap.insert_count("last", 3);
        // Rewriting the union keeps its slot between first and last.
        snap.insert_count("union", 5);

        assert_eq!(snap.keys().collect::<Vec<_>>(), ["first", "union", "last"]);
        assert_eq!(snap.get("union"), Some(&MetricValue::Count(5)));
        assert_eq!(snap.len(), 3);
    }

    #[test]
    fn distinct_pair_uses_shared_subject() {
        let mut snap = MetricsSnapshot::new("gocdb_metric", "t");
        snap.insert_distinct("countries using GOCDB", &set(&["Algeria"]));

        assert_eq!(
            snap.get("Number of countries using GOCDB"),
            Some(&MetricValue::Count(1))
        );
        assert_eq!(
            snap.get("List of countries using GOCDB"),
            Some(&MetricValue::List(vec!["Algeria".to_string()]))
        );
    }

    #[test]
    fn union_pair_uses_total_and_complete_phrasing() {
        let mut snap = MetricsSnapshot::new("apel_metric", "t");
        snap.insert_union("countries using APEL", &set(&["CRETE", "France"]));

        assert_eq!(
            snap.get("Total number of countries using APEL"),
            Some(&MetricValue::Count(2))
        );
        assert!(snap.contains_key("Complete list of countries using APEL"));
    }

    #[test]
    fn absent_aggregates_are_absent_keys() {
        let snap = MetricsSnapshot::new("gocdb_metric", "t");
        let json = serde_json::to_value(&snap).unwrap();
        // Only the envelope is present — no null or zero placeholders.
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn metric_values_serialize_flat() {
        let mut snap = MetricsSnapshot::new("apel_metric", "t");
        snap.insert_count("count", 7);
        snap.insert("text", MetricValue::Text("MD-02-IMI".to_string()));
        snap.insert_list("list", vec!["a".to_string(), "b".to_string()]);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["count"], 7);
        assert_eq!(json["text"], "MD-02-IMI");
        assert_eq!(json["list"], serde_json::json!(["a", "b"]));
    }
}
