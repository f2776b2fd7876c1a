//! Pagination tracking.
//!
//! Holds the current page and page size and derives the limit/offset pair
//! for request payload construction. Query parsing is permissive: malformed
//! values fall back to the defaults.

use crate::query::LocationQuery;
use serde::{Deserialize, Serialize};

/// Query key carrying the 1-based page number.
pub const PAGE_KEY: &str = "page";

/// Query key carrying the page size.
pub const PAGE_SIZE_KEY: &str = "pageSize";

const DEFAULT_PAGE_SIZE: u64 = 10;

/// Current page and page size of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    page: u64,
    page_size: u64,
}

impl Pagination {
    /// Creates a tracker, clamping the page to at least 1 and the page size
    /// to at least 1.
    #[must_use]
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Creates a tracker on page 1 with the given page size.
    #[must_use]
    pub fn with_page_size(page_size: u64) -> Self {
        Self::new(1, page_size)
    }

    /// Returns the 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Derives the request limit/offset pair: `limit = page_size`,
    /// `offset = (page - 1) * page_size`.
    #[must_use]
    pub const fn limit_offset(&self) -> (i64, i64) {
        (
            self.page_size as i64,
            (self.page - 1).saturating_mul(self.page_size) as i64,
        )
    }

    /// Moves to the given page without touching the page size.
    pub fn set_page(&mut self, page: u64) {
        self.page = page.max(1);
    }

    /// Changes the page size and returns to page 1, since the previous
    /// offset would no longer address the same rows.
    pub fn set_page_size(&mut self, page_size: u64) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Returns to page 1.
    ///
    /// Invoked whenever filters or sort change, never on pure page
    /// navigation; a stale page against a newly-filtered result set would
    /// request an out-of-range offset.
    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Reconciles the query form, falling back to `base` for missing or
    /// malformed values.
    pub fn from_query(query: &LocationQuery, base: Pagination) -> Self {
        let page = query
            .first(PAGE_KEY)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(base.page);
        let page_size = query
            .first(PAGE_SIZE_KEY)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(base.page_size);
        Self::new(page, page_size)
    }

    /// Serializes into the `page`/`pageSize` query fragment.
    ///
    /// Only values differing from `base` are emitted so canonical queries
    /// stay minimal.
    pub fn to_query(&self, base: Pagination) -> LocationQuery {
        let mut query = LocationQuery::new();
        if self.page != base.page {
            query.insert(PAGE_KEY, self.page.to_string());
        }
        if self.page_size != base.page_size {
            query.insert(PAGE_SIZE_KEY, self.page_size.to_string());
        }
        query
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_offset_derivation() {
        assert_eq!(Pagination::new(1, 10).limit_offset(), (10, 0));
        assert_eq!(Pagination::new(3, 25).limit_offset(), (25, 50));
    }

    #[test]
    fn page_clamps_to_one() {
        let pagination = Pagination::new(0, 0);
        assert_eq!(pagination.page(), 1);
        assert_eq!(pagination.page_size(), 1);
    }

    #[test]
    fn reset_returns_to_first_page() {
        let mut pagination = Pagination::new(7, 10);
        pagination.reset();
        assert_eq!(pagination.page(), 1);
        assert_eq!(pagination.page_size(), 10);
    }

    #[test]
    fn page_size_change_resets_page() {
        let mut pagination = Pagination::new(4, 10);
        pagination.set_page_size(50);
        assert_eq!(pagination.page(), 1);
        assert_eq!(pagination.page_size(), 50);
    }

    #[test]
    fn query_parsing_is_permissive() {
        let query: LocationQuery = [("page", "3"), ("pageSize", "nope")].into_iter().collect();
        let pagination = Pagination::from_query(&query, Pagination::default());
        assert_eq!(pagination.page(), 3);
        assert_eq!(pagination.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn query_fragment_omits_defaults() {
        let base = Pagination::default();
        assert!(base.to_query(base).is_empty());

        let moved = Pagination::new(2, 10);
        let query = moved.to_query(base);
        assert_eq!(query.first(PAGE_KEY), Some("2"));
        assert!(!query.contains_key(PAGE_SIZE_KEY));

        let roundtripped = Pagination::from_query(&query, base);
        assert_eq!(roundtripped, moved);
    }
}
