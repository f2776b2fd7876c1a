//! # PageSync Query
//!
//! Facet reconciliation for PageSync.
//!
//! This crate provides the pure transforms between the serialized
//! (query-string) representation of a paged listing and its validated
//! in-memory representation:
//! - Location query model (string keys, string or string-array values)
//! - Sort reconciliation (multi-column, query round-trip, default fallback)
//! - Filter reconciliation (schema validation, matchers, search tokens)
//! - Pagination tracking (page/page-size, limit/offset derivation)
//! - The uniform collection shape returned by backends
//!
//! ## Key Invariants
//!
//! - Reconciliation is permissive: unknown keys and malformed values are
//!   dropped, never surfaced as errors
//! - Serializing a reconciled facet and reconciling it again is a fixpoint
//! - No I/O and no side effects anywhere in this crate

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod filter;
mod pagination;
mod query;
mod sort;

pub use collection::{Collection, UNBOUNDED_LIMIT};
pub use filter::{
    parse_search_tokens, FilterSchema, FilterState, FilterValue, MatcherDef, NoSchema,
};
pub use pagination::{Pagination, PAGE_KEY, PAGE_SIZE_KEY};
pub use query::{LocationQuery, QueryValue};
pub use sort::{SortDirection, SortEntry, SortOptions, SortSpec, SORT_BY_KEY, SORT_DESC_KEY};
