//! Property-based test generators using proptest.
//!
//! Provides strategies for generating sort specifications and arbitrary
//! location queries that maintain (or deliberately violate) the reconcilers'
//! input expectations.

use pagesync_query::{LocationQuery, QueryValue, SortEntry, SortSpec};
use proptest::prelude::*;

/// Columns the generated sort entries draw from.
pub const SORT_COLUMNS: [&str; 4] = ["timestamp", "type", "amount", "rate"];

/// Strategy for one sort entry over [`SORT_COLUMNS`].
pub fn sort_entry_strategy() -> impl Strategy<Value = SortEntry> {
    (prop::sample::select(SORT_COLUMNS.to_vec()), any::<bool>()).prop_map(|(column, desc)| {
        if desc {
            SortEntry::desc(column)
        } else {
            SortEntry::asc(column)
        }
    })
}

/// Strategy for a sort specification of 1 to `max_entries` entries.
pub fn sort_spec_strategy(max_entries: usize) -> impl Strategy<Value = SortSpec> {
    prop::collection::vec(sort_entry_strategy(), 1..=max_entries.max(1)).prop_map(SortSpec::new)
}

/// Strategy for a single query value: a string or a short string list.
pub fn query_value_strategy() -> impl Strategy<Value = QueryValue> {
    prop_oneof![
        "[a-zA-Z0-9:. ]{0,16}".prop_map(QueryValue::Single),
        prop::collection::vec("[a-zA-Z0-9]{0,8}".prop_map(String::from), 0..4)
            .prop_map(QueryValue::Multi),
    ]
}

/// Strategy for an arbitrary location query, including keys no reconciler
/// owns and values of either shape.
pub fn location_query_strategy() -> impl Strategy<Value = LocationQuery> {
    prop::collection::btree_map("[a-zA-Z]{1,12}".prop_map(String::from), query_value_strategy(), 0..8)
        .prop_map(|map| map.into_iter().collect())
}
