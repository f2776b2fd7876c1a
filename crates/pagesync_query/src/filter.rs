//! Filter reconciliation.
//!
//! Domain filters are validated against an entity-specific schema before they
//! ever reach a request payload. Validation is permissive: unknown keys and
//! values outside an enumerated set are dropped, never surfaced as errors,
//! since location queries may be hand-edited or stale. Free-text search
//! tokens that do not match a structured matcher are preserved verbatim.

use crate::query::LocationQuery;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A validated filter value: one string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A single value.
    Single(String),
    /// Multiple values for a key that accepts them.
    Multi(Vec<String>),
}

impl FilterValue {
    /// Returns all values, treating a single value as a one-element list.
    pub fn values(&self) -> Vec<&str> {
        match self {
            FilterValue::Single(s) => vec![s.as_str()],
            FilterValue::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Single(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Single(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::Multi(values)
    }
}

/// Validated filters for one entity: filter-key to value(s).
///
/// Instances are produced only by [`FilterSchema::validate`]; an entity with
/// a schema always has a state (possibly empty), an entity without one has
/// none at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState(BTreeMap<String, FilterValue>);

impl FilterState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no filters are active.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of active filter keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    /// Inserts a value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Removes `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        self.0.remove(key)
    }

    /// Iterates over active filters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.0.iter()
    }

    /// Serializes the state into a location-query fragment.
    pub fn to_query(&self) -> LocationQuery {
        self.0
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    FilterValue::Single(s) => crate::query::QueryValue::Single(s.clone()),
                    FilterValue::Multi(v) => crate::query::QueryValue::Multi(v.clone()),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for FilterState {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Describes one filterable dimension and its accepted value grammar.
///
/// Matchers are static per entity and independent of current filter values;
/// UIs use them to offer `key:value` search-token completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherDef {
    /// The filter key, also the query-string key this dimension serializes to.
    pub key: String,
    /// Human-readable description of the dimension.
    pub description: String,
    /// Accepted values, when the dimension is enumerated. `None` accepts any.
    pub allowed: Option<Vec<String>>,
    /// Whether the key accepts multiple simultaneous values.
    pub multiple: bool,
}

impl MatcherDef {
    /// Creates a matcher accepting any single value.
    pub fn any(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            allowed: None,
            multiple: false,
        }
    }

    /// Creates a matcher restricted to an enumerated value set.
    pub fn enumerated<I, S>(
        key: impl Into<String>,
        description: impl Into<String>,
        allowed: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            description: description.into(),
            allowed: Some(allowed.into_iter().map(Into::into).collect()),
            multiple: false,
        }
    }

    /// Marks the matcher as accepting multiple values.
    pub fn with_multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Returns true if `value` is acceptable for this dimension.
    pub fn accepts(&self, value: &str) -> bool {
        match &self.allowed {
            Some(allowed) => allowed.iter().any(|a| a == value),
            None => !value.is_empty(),
        }
    }
}

/// Splits a free-text search input into structured `key:value` tokens and a
/// verbatim remainder.
///
/// A token matches when its key names a matcher and the value passes that
/// matcher's grammar; everything else stays in the remainder in input order.
pub fn parse_search_tokens(
    input: &str,
    matchers: &[MatcherDef],
) -> (Vec<(String, String)>, Vec<String>) {
    let mut matched = Vec::new();
    let mut rest = Vec::new();

    for token in input.split_whitespace() {
        let structured = token.split_once(':').and_then(|(key, value)| {
            matchers
                .iter()
                .find(|m| m.key == key && m.accepts(value))
                .map(|m| (m.key.clone(), value.to_string()))
        });
        match structured {
            Some(pair) => matched.push(pair),
            None => rest.push(token.to_string()),
        }
    }

    (matched, rest)
}

/// The injected per-entity filter capability.
///
/// Entities without structured filtering simply do not supply an
/// implementation; the engine then reports no filters and no matchers at all.
pub trait FilterSchema: Send + Sync {
    /// Returns the static matcher descriptors for this entity.
    fn matchers(&self) -> Vec<MatcherDef>;

    /// Returns the query key holding free-text search input, if the entity
    /// supports one.
    fn free_text_key(&self) -> Option<&str> {
        None
    }

    /// Returns the filter state applied before any user edit.
    fn default_filter(&self) -> FilterState {
        FilterState::new()
    }

    /// Validates raw, possibly partial candidate values into a filter state.
    ///
    /// Unknown keys are dropped silently. Values outside an enumerated set
    /// are dropped. Free-text input is split into structured tokens where
    /// the grammar matches; the remainder is preserved verbatim under the
    /// free-text key.
    fn validate(&self, raw: &LocationQuery) -> FilterState {
        let matchers = self.matchers();
        let mut state = self.default_filter();

        for matcher in &matchers {
            let values: Vec<String> = raw
                .values(&matcher.key)
                .into_iter()
                .filter(|v| matcher.accepts(v))
                .map(String::from)
                .collect();
            if values.is_empty() {
                continue;
            }
            if matcher.multiple {
                state.insert(matcher.key.clone(), values);
            } else {
                state.insert(matcher.key.clone(), values[0].clone());
            }
        }

        if let Some(free_text_key) = self.free_text_key() {
            if let Some(input) = raw.first(free_text_key) {
                let (matched, rest) = parse_search_tokens(input, &matchers);
                for (key, value) in matched {
                    let multiple = matchers.iter().any(|m| m.key == key && m.multiple);
                    if multiple {
                        let mut values = match state.remove(&key) {
                            Some(FilterValue::Multi(values)) => values,
                            Some(FilterValue::Single(value)) => vec![value],
                            None => Vec::new(),
                        };
                        values.push(value);
                        state.insert(key, values);
                    } else {
                        state.insert(key, value);
                    }
                }
                if !rest.is_empty() {
                    state.insert(free_text_key, rest.join(" "));
                }
            }
        }

        state
    }
}

/// Schema for entities with no structured filtering.
///
/// Exists so the engine type stays nameable without a schema parameter; it is
/// never consulted since the engine holds it behind an absent option.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSchema;

impl FilterSchema for NoSchema {
    fn matchers(&self) -> Vec<MatcherDef> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct TradeSchema;

    impl FilterSchema for TradeSchema {
        fn matchers(&self) -> Vec<MatcherDef> {
            vec![
                MatcherDef::any("location", "exchange the trade happened on"),
                MatcherDef::any("asset", "traded asset").with_multiple(),
                MatcherDef::enumerated("action", "trade side", ["buy", "sell"]),
                MatcherDef::enumerated(
                    "includeIgnoredTrades",
                    "include trades marked as ignored",
                    ["true", "false"],
                ),
            ]
        }

        fn free_text_key(&self) -> Option<&str> {
            Some("search")
        }
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let raw: LocationQuery = [("location", "kraken"), ("bogus", "1"), ("tab", "history")]
            .into_iter()
            .collect();

        let state = TradeSchema.validate(&raw);
        assert_eq!(state.len(), 1);
        assert_eq!(state.get("location"), Some(&FilterValue::from("kraken")));
    }

    #[test]
    fn enumerated_values_are_enforced() {
        let raw: LocationQuery = [("action", "hold")].into_iter().collect();
        assert!(TradeSchema.validate(&raw).is_empty());

        let raw: LocationQuery = [("action", "buy")].into_iter().collect();
        let state = TradeSchema.validate(&raw);
        assert_eq!(state.get("action"), Some(&FilterValue::from("buy")));
    }

    #[test]
    fn multi_value_keys_keep_all_values() {
        let raw: LocationQuery = [("asset", vec!["BTC", "ETH"])].into_iter().collect();
        let state = TradeSchema.validate(&raw);
        assert_eq!(
            state.get("asset"),
            Some(&FilterValue::Multi(vec!["BTC".into(), "ETH".into()]))
        );
    }

    #[test]
    fn single_value_keys_take_the_first() {
        let raw: LocationQuery = [("location", vec!["kraken", "binance"])]
            .into_iter()
            .collect();
        let state = TradeSchema.validate(&raw);
        assert_eq!(state.get("location"), Some(&FilterValue::from("kraken")));
    }

    #[test]
    fn search_tokens_split_into_structured_and_rest() {
        let (matched, rest) = parse_search_tokens(
            "action:buy margin location:kraken action:hold",
            &TradeSchema.matchers(),
        );

        assert_eq!(
            matched,
            vec![
                ("action".to_string(), "buy".to_string()),
                ("location".to_string(), "kraken".to_string()),
            ]
        );
        // action:hold fails the grammar and stays free text.
        assert_eq!(rest, vec!["margin", "action:hold"]);
    }

    #[test]
    fn free_text_remainder_is_preserved_verbatim() {
        let raw: LocationQuery = [("search", "action:sell some note")].into_iter().collect();
        let state = TradeSchema.validate(&raw);

        assert_eq!(state.get("action"), Some(&FilterValue::from("sell")));
        assert_eq!(state.get("search"), Some(&FilterValue::from("some note")));

        // Re-validating the serialized form is a fixpoint.
        let again = TradeSchema.validate(&state.to_query());
        assert_eq!(again, state);
    }

    #[test]
    fn search_tokens_accumulate_on_multi_value_keys() {
        let raw: LocationQuery = [("asset", vec!["BTC"]), ("search", vec!["asset:ETH"])]
            .into_iter()
            .collect();
        let state = TradeSchema.validate(&raw);

        assert_eq!(
            state.get("asset"),
            Some(&FilterValue::Multi(vec!["BTC".into(), "ETH".into()]))
        );

        let again = TradeSchema.validate(&state.to_query());
        assert_eq!(again, state);
    }

    #[test]
    fn no_schema_has_no_matchers() {
        assert!(NoSchema.matchers().is_empty());
        assert!(NoSchema.free_text_key().is_none());
        let raw: LocationQuery = [("anything", "x")].into_iter().collect();
        assert!(NoSchema.validate(&raw).is_empty());
    }

    #[test]
    fn state_query_fragment_roundtrip() {
        let state: FilterState = [("location", FilterValue::from("kraken"))]
            .into_iter()
            .collect();
        let fragment = state.to_query();
        assert_eq!(fragment.first("location"), Some("kraken"));
        assert_eq!(TradeSchema.validate(&fragment), state);
    }

    proptest! {
        #[test]
        fn validate_never_panics_and_drops_unknown_keys(
            keys in prop::collection::vec("[a-zA-Z]{1,12}", 0..6),
            values in prop::collection::vec("[a-zA-Z0-9:. ]{0,20}", 0..6),
        ) {
            let raw: LocationQuery = keys
                .iter()
                .zip(values.iter())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            let state = TradeSchema.validate(&raw);
            let matchers = TradeSchema.matchers();

            for (key, _) in state.iter() {
                prop_assert!(matchers.iter().any(|m| &m.key == key) || key == "search");
            }
        }
    }
}
