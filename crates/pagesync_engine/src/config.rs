//! Engine configuration.

use pagesync_query::{Pagination, SortOptions};
use std::collections::BTreeMap;

/// Whether facet state is synchronized with the navigable location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryMode {
    /// Facets are mirrored into the host's location query: reads on
    /// construction, pushes on facet changes, fetches on external changes.
    Router,
    /// Facets live only in memory; the location is never read or written.
    #[default]
    Memory,
}

impl HistoryMode {
    /// Returns true for router synchronization.
    pub fn is_router(&self) -> bool {
        matches!(self, HistoryMode::Router)
    }
}

/// Options for constructing a fetch engine.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Location synchronization mode.
    pub history: HistoryMode,
    /// Sortable columns, multi-sort limit, and default sort entry.
    pub sort: SortOptions,
    /// Initial page and default page size.
    pub pagination: Pagination,
    /// Static parameters merged into every request payload.
    pub static_params: BTreeMap<String, String>,
    /// Caller-fixed scope narrowing every request (serialized as the
    /// `location` parameter), e.g. a single exchange.
    pub location_overview: Option<String>,
}

impl EngineOptions {
    /// Creates the default options: memory history, single-column timestamp
    /// sort ascending, page 1 of 10.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the history mode.
    pub fn with_history(mut self, history: HistoryMode) -> Self {
        self.history = history;
        self
    }

    /// Sets the sort options.
    pub fn with_sort(mut self, sort: SortOptions) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the initial pagination state.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Adds a static parameter carried on every request.
    pub fn with_static_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.static_params.insert(key.into(), value.into());
        self
    }

    /// Sets the location-overview scope.
    pub fn with_location_overview(mut self, overview: impl Into<String>) -> Self {
        self.location_overview = Some(overview.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesync_query::SortEntry;

    #[test]
    fn defaults() {
        let options = EngineOptions::new();
        assert_eq!(options.history, HistoryMode::Memory);
        assert!(!options.history.is_router());
        assert_eq!(options.sort.default_entry(), &SortEntry::asc("timestamp"));
        assert_eq!(options.pagination.page(), 1);
        assert!(options.static_params.is_empty());
        assert!(options.location_overview.is_none());
    }

    #[test]
    fn builder_chain() {
        let options = EngineOptions::new()
            .with_history(HistoryMode::Router)
            .with_static_param("includeIgnoredTrades", "true")
            .with_location_overview("binance");

        assert!(options.history.is_router());
        assert_eq!(
            options.static_params.get("includeIgnoredTrades"),
            Some(&"true".to_string())
        );
        assert_eq!(options.location_overview.as_deref(), Some("binance"));
    }
}
