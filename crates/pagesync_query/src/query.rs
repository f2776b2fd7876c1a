//! Location query model.
//!
//! A location query is the flat string-keyed mapping a host router exposes
//! for the current navigable location. Values are either a single string or
//! a string array, per the usual query-string encoding conventions. It is
//! the serialized superset of all three facets (sort, filters, pagination)
//! plus any keys the host application manages itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single query value: one string or an ordered list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// A single string value.
    Single(String),
    /// An ordered list of string values.
    Multi(Vec<String>),
}

impl QueryValue {
    /// Returns the value as a single string, taking the first entry of a
    /// list value.
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryValue::Single(s) => Some(s),
            QueryValue::Multi(values) => values.first().map(String::as_str),
        }
    }

    /// Returns all values, treating a single value as a one-element list.
    pub fn values(&self) -> Vec<&str> {
        match self {
            QueryValue::Single(s) => vec![s.as_str()],
            QueryValue::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// Returns the number of values carried.
    pub fn len(&self) -> usize {
        match self {
            QueryValue::Single(_) => 1,
            QueryValue::Multi(values) => values.len(),
        }
    }

    /// Returns true if a list value carries no entries.
    pub fn is_empty(&self) -> bool {
        matches!(self, QueryValue::Multi(values) if values.is_empty())
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::Multi(values)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        QueryValue::Multi(values.into_iter().map(String::from).collect())
    }
}

/// An ordered mapping of query keys to values.
///
/// Comparison is by value, which makes [`LocationQuery`] equality the
/// primitive for self-push suppression: a query pushed by the engine and the
/// same query observed back from the router compare equal regardless of how
/// either was constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationQuery(BTreeMap<String, QueryValue>);

impl LocationQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the query carries no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.get(key)
    }

    /// Returns the first string stored under `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(QueryValue::first)
    }

    /// Returns all strings stored under `key`; empty when absent.
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.0.get(key).map(QueryValue::values).unwrap_or_default()
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Inserts a value under `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Removes `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<QueryValue> {
        self.0.remove(key)
    }

    /// Iterates over all key/value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &QueryValue)> {
        self.0.iter()
    }

    /// Returns a copy without the given keys.
    ///
    /// Used to strip the engine-owned key set before merging facet fragments
    /// back in, so keys the host application manages are preserved verbatim.
    pub fn without_keys<'a, I>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out = self.clone();
        for key in keys {
            out.0.remove(key);
        }
        out
    }

    /// Merges `other` into this query; keys in `other` win.
    pub fn merge(&mut self, other: LocationQuery) {
        self.0.extend(other.0);
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for LocationQuery {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for LocationQuery {
    type Item = (String, QueryValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, QueryValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_and_multi_access() {
        let mut query = LocationQuery::new();
        query.insert("location", "kraken");
        query.insert("sortBy", vec!["type", "timestamp"]);

        assert_eq!(query.first("location"), Some("kraken"));
        assert_eq!(query.values("location"), vec!["kraken"]);
        assert_eq!(query.values("sortBy"), vec!["type", "timestamp"]);
        assert_eq!(query.first("sortBy"), Some("type"));
        assert!(query.values("missing").is_empty());
    }

    #[test]
    fn value_equality() {
        let a: LocationQuery = [("sortBy", vec!["type"]), ("sortDesc", vec!["true"])]
            .into_iter()
            .collect();
        let mut b = LocationQuery::new();
        b.insert("sortDesc", vec!["true"]);
        b.insert("sortBy", vec!["type"]);

        assert_eq!(a, b);
    }

    #[test]
    fn without_keys_preserves_the_rest() {
        let query: LocationQuery = [("sortBy", "type"), ("tab", "history"), ("page", "3")]
            .into_iter()
            .collect();

        let stripped = query.without_keys(["sortBy", "page", "absent"]);
        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped.first("tab"), Some("history"));
    }

    #[test]
    fn merge_overwrites() {
        let mut base: LocationQuery = [("tab", "history"), ("page", "1")].into_iter().collect();
        let fragment: LocationQuery = [("page", "2")].into_iter().collect();

        base.merge(fragment);
        assert_eq!(base.first("page"), Some("2"));
        assert_eq!(base.first("tab"), Some("history"));
    }

    #[test]
    fn serde_roundtrip() {
        let query: LocationQuery = [
            ("location", QueryValue::from("kraken")),
            ("sortBy", QueryValue::from(vec!["type"])),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&query).unwrap();
        assert_eq!(json, r#"{"location":"kraken","sortBy":["type"]}"#);

        let back: LocationQuery = serde_json::from_str(&json).unwrap();
        assert_eq!(back, query);
    }
}
