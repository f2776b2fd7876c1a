//! The pagination/filter/fetch synchronization engine.
//!
//! [`FetchEngine`] ties the three reconciled facets (sort, filters,
//! pagination) to an injected data source and an injected location
//! navigator. Facet changes compose a canonical location query, mirror it
//! into the navigable location when history synchronization is enabled, and
//! trigger a fetch; overlapping fetches are serialized by a last-request-wins
//! supersession rule so a stale response never overwrites a newer one.

use crate::cell::Cell;
use crate::config::{EngineOptions, HistoryMode};
use crate::error::EngineResult;
use crate::navigator::LocationNavigator;
use crate::source::{DataSource, FetchRequest};
use async_trait::async_trait;
use pagesync_query::{
    FilterSchema, FilterState, LocationQuery, MatcherDef, NoSchema, Pagination, SortSpec,
    PAGE_KEY, PAGE_SIZE_KEY, SORT_BY_KEY, SORT_DESC_KEY,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Receiver;

/// Statistics about engine activity.
#[derive(Debug, Clone, Default)]
pub struct FetchStats {
    /// Fetches issued.
    pub fetches_issued: u64,
    /// Fetch results applied to the result state.
    pub fetches_applied: u64,
    /// Fetch results discarded because a newer request had been issued.
    pub fetches_superseded: u64,
    /// Fetches whose source rejected.
    pub fetches_failed: u64,
    /// Location pushes accepted by the navigator.
    pub pushes: u64,
    /// Facet changes short-circuited because the canonical query was
    /// unchanged.
    pub pushes_suppressed: u64,
    /// Location pushes the navigator rejected.
    pub pushes_failed: u64,
}

/// Resolves validated filters asynchronously before a fetch proceeds, e.g.
/// mapping a free-text asset symbol to its identifier.
///
/// Resolution must be idempotent; a failed resolution degrades to the
/// unresolved filters and never fails the fetch.
#[async_trait]
pub trait FilterLookup: Send + Sync {
    /// Resolves the given filters.
    async fn resolve(&self, filters: FilterState) -> EngineResult<FilterState>;
}

/// The synchronization/fetch engine for one paged, sortable, filterable
/// entity listing.
///
/// Generic over the injected data source `S` (which fixes the entry and
/// collection types), the location navigator `N`, and the optional filter
/// schema `F`. The engine owns its facet and result state for the lifetime
/// of the consuming view; the navigable location is owned by the host but
/// the engine is the sole writer of its owned key subset.
pub struct FetchEngine<S, N, F = NoSchema>
where
    S: DataSource,
    N: LocationNavigator,
    F: FilterSchema,
{
    source: S,
    navigator: N,
    schema: Option<F>,
    lookup: Option<Box<dyn FilterLookup>>,
    on_update_filters: Option<Box<dyn Fn(&LocationQuery) + Send + Sync>>,
    options: EngineOptions,
    sort: RwLock<SortSpec>,
    filters: RwLock<Option<FilterState>>,
    pagination: RwLock<Pagination>,
    state: Cell<S::Collection>,
    loading: Cell<bool>,
    user_action: Cell<bool>,
    last_query: RwLock<Option<LocationQuery>>,
    latest_request: AtomicU64,
    stats: RwLock<FetchStats>,
}

impl<S, N> FetchEngine<S, N, NoSchema>
where
    S: DataSource,
    N: LocationNavigator,
{
    /// Creates an engine for an entity without structured filtering.
    ///
    /// [`FetchEngine::filters`] and [`FetchEngine::matchers`] report absent
    /// for such an engine, before and after any fetch.
    pub fn new(source: S, navigator: N, options: EngineOptions) -> Self {
        Self::build(source, navigator, None, options)
    }
}

impl<S, N, F> FetchEngine<S, N, F>
where
    S: DataSource,
    N: LocationNavigator,
    F: FilterSchema,
{
    /// Creates an engine with a filter schema capability.
    pub fn with_schema(source: S, navigator: N, schema: F, options: EngineOptions) -> Self {
        Self::build(source, navigator, Some(schema), options)
    }

    /// Attaches an asynchronous filter lookup, awaited before every fetch
    /// that carries filters.
    pub fn with_lookup(mut self, lookup: impl FilterLookup + 'static) -> Self {
        self.lookup = Some(Box::new(lookup));
        self
    }

    /// Attaches a hook invoked with the location query whenever facets are
    /// reconciled from one, letting the consumer mirror derived state (e.g.
    /// a checkbox bound to a static param).
    pub fn with_on_update_filters(
        mut self,
        hook: impl Fn(&LocationQuery) + Send + Sync + 'static,
    ) -> Self {
        self.on_update_filters = Some(Box::new(hook));
        self
    }

    fn build(source: S, navigator: N, schema: Option<F>, options: EngineOptions) -> Self {
        let state = Cell::new(source.empty_collection());
        let filters = schema.as_ref().map(|s| s.default_filter());
        let engine = Self {
            sort: RwLock::new(SortSpec::default().normalize(&options.sort)),
            filters: RwLock::new(filters),
            pagination: RwLock::new(options.pagination),
            state,
            loading: Cell::new(false),
            user_action: Cell::new(false),
            last_query: RwLock::new(None),
            latest_request: AtomicU64::new(0),
            stats: RwLock::new(FetchStats::default()),
            source,
            navigator,
            schema,
            lookup: None,
            on_update_filters: None,
            options,
        };

        // With history enabled the location is the source of truth: its
        // current query becomes the initial facet state, without an extra
        // fetch-triggering push.
        if engine.options.history.is_router() {
            let query = engine.navigator.current_query();
            engine.reconcile(&query);
            *engine.last_query.write() = Some(query);
        }

        engine
    }

    /// Returns the current sort specification.
    pub fn sort(&self) -> SortSpec {
        self.sort.read().clone()
    }

    /// Returns the validated filters, or `None` when the entity has no
    /// filter schema.
    pub fn filters(&self) -> Option<FilterState> {
        self.filters.read().clone()
    }

    /// Returns the entity's matcher descriptors, or `None` when the entity
    /// has no filter schema.
    pub fn matchers(&self) -> Option<Vec<MatcherDef>> {
        self.schema.as_ref().map(|s| s.matchers())
    }

    /// Returns the last-applied collection, or the entity's default-empty
    /// collection before the first successful fetch.
    pub fn state(&self) -> S::Collection {
        self.state.get()
    }

    /// Returns true while the newest issued fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    /// Returns true once the consumer has made any explicit interaction.
    pub fn user_action(&self) -> bool {
        self.user_action.get()
    }

    /// Overrides the user-action flag.
    pub fn set_user_action(&self, value: bool) {
        self.user_action.set(value);
    }

    /// Returns the current 1-based page.
    pub fn page(&self) -> u64 {
        self.pagination.read().page()
    }

    /// Returns the current page size.
    pub fn page_size(&self) -> u64 {
        self.pagination.read().page_size()
    }

    /// Returns a snapshot of the engine's activity counters.
    pub fn stats(&self) -> FetchStats {
        self.stats.read().clone()
    }

    /// Subscribes to result-state replacements.
    pub fn subscribe_state(&self) -> Receiver<S::Collection> {
        self.state.subscribe()
    }

    /// Subscribes to loading-flag changes.
    pub fn subscribe_loading(&self) -> Receiver<bool> {
        self.loading.subscribe()
    }

    /// Subscribes to user-action flag changes.
    pub fn subscribe_user_action(&self) -> Receiver<bool> {
        self.user_action.subscribe()
    }

    /// Replaces the sort specification and fetches.
    ///
    /// The spec is normalized against the engine's sort options (unknown
    /// columns dropped, truncated, default applied) and pagination returns
    /// to page 1. Returns false when the canonical query was unchanged and
    /// the cycle was short-circuited.
    pub async fn set_sort(&self, spec: SortSpec) -> EngineResult<bool> {
        self.user_action.set(true);
        *self.sort.write() = spec.normalize(&self.options.sort);
        self.pagination.write().reset();
        self.sync_facets().await
    }

    /// Validates raw candidate filter values through the schema, replaces
    /// the filter state, and fetches. Pagination returns to page 1.
    ///
    /// A no-op returning `Ok(false)` for entities without a schema.
    pub async fn set_filters(&self, raw: &LocationQuery) -> EngineResult<bool> {
        self.user_action.set(true);
        let Some(schema) = &self.schema else {
            return Ok(false);
        };
        *self.filters.write() = Some(schema.validate(raw));
        self.pagination.write().reset();
        self.sync_facets().await
    }

    /// Moves to the given page and fetches. Pure page navigation never
    /// resets other facets.
    pub async fn set_page(&self, page: u64) -> EngineResult<bool> {
        self.user_action.set(true);
        self.pagination.write().set_page(page);
        self.sync_facets().await
    }

    /// Changes the page size (returning to page 1) and fetches.
    pub async fn set_page_size(&self, page_size: u64) -> EngineResult<bool> {
        self.user_action.set(true);
        self.pagination.write().set_page_size(page_size);
        self.sync_facets().await
    }

    /// Builds the request payload from the current facets and performs a
    /// fetch, applying the result under the supersession rule.
    ///
    /// The returned collection is this call's own result either way; engine
    /// state only reflects it when no newer request was issued meanwhile.
    pub async fn fetch_data(&self) -> EngineResult<S::Collection> {
        self.user_action.set(true);
        let request = self.build_request();
        self.dispatch(request).await
    }

    /// Performs a fetch with an explicit request payload, bypassing payload
    /// construction but not the supersession rule.
    pub async fn fetch_with(&self, request: FetchRequest) -> EngineResult<S::Collection> {
        self.user_action.set(true);
        self.dispatch(request).await
    }

    /// Forces one reconciliation+fetch cycle from the current location,
    /// e.g. after navigating here through a notification link.
    ///
    /// A no-op returning `Ok(false)` when history synchronization is off.
    pub async fn apply_route_filter(&self) -> EngineResult<bool> {
        self.user_action.set(true);
        if !self.options.history.is_router() {
            return Ok(false);
        }
        let query = self.navigator.current_query();
        self.reconcile(&query);
        *self.last_query.write() = Some(query);
        self.dispatch(self.build_request()).await?;
        Ok(true)
    }

    /// Reacts to an externally observed location change.
    ///
    /// The engine's own last push is recognized by value equality and
    /// ignored, so mirroring facets into the location never feeds back into
    /// a redundant fetch. Any other query is reconciled into the facets and
    /// fetched. Returns whether a fetch was triggered.
    pub async fn handle_location_change(&self, query: LocationQuery) -> EngineResult<bool> {
        if !self.options.history.is_router() {
            return Ok(false);
        }
        if self.last_query.read().as_ref() == Some(&query) {
            tracing::debug!("location change matches last push, ignoring");
            return Ok(false);
        }
        self.reconcile(&query);
        *self.last_query.write() = Some(query);
        self.dispatch(self.build_request()).await?;
        Ok(true)
    }

    /// Reconciles all three facets from a location query.
    fn reconcile(&self, query: &LocationQuery) {
        *self.sort.write() = SortSpec::from_query(query, &self.options.sort);
        *self.pagination.write() = Pagination::from_query(query, self.options.pagination);
        if let Some(schema) = &self.schema {
            *self.filters.write() = Some(schema.validate(query));
        }
        if let Some(hook) = &self.on_update_filters {
            hook(query);
        }
    }

    /// The query keys this engine owns and rewrites on push.
    fn owned_keys(&self) -> Vec<String> {
        let mut keys = vec![
            SORT_BY_KEY.to_string(),
            SORT_DESC_KEY.to_string(),
            PAGE_KEY.to_string(),
            PAGE_SIZE_KEY.to_string(),
        ];
        if let Some(schema) = &self.schema {
            keys.extend(schema.matchers().into_iter().map(|m| m.key));
            if let Some(free_text) = schema.free_text_key() {
                keys.push(free_text.to_string());
            }
        }
        keys
    }

    /// Composes the canonical location query from the current facets,
    /// preserving location keys this engine does not own.
    fn canonical_query(&self) -> LocationQuery {
        let mut query = if self.options.history.is_router() {
            let owned = self.owned_keys();
            self.navigator
                .current_query()
                .without_keys(owned.iter().map(String::as_str))
        } else {
            LocationQuery::new()
        };
        query.merge(self.sort.read().to_query());
        query.merge(self.pagination.read().to_query(self.options.pagination));
        if let Some(filters) = self.filters.read().as_ref() {
            query.merge(filters.to_query());
        }
        query
    }

    /// Mirrors a facet change into the location and fetches.
    ///
    /// An unchanged canonical query short-circuits the whole cycle; a
    /// rejected push leaves the in-memory facets authoritative for the
    /// fetch that follows.
    async fn sync_facets(&self) -> EngineResult<bool> {
        let canonical = self.canonical_query();
        if self.last_query.read().as_ref() == Some(&canonical) {
            self.stats.write().pushes_suppressed += 1;
            return Ok(false);
        }

        if self.options.history.is_router() {
            if self.navigator.push_query(canonical.clone()) {
                self.stats.write().pushes += 1;
            } else {
                self.stats.write().pushes_failed += 1;
                tracing::warn!("location push rejected, keeping in-memory facets");
            }
        }
        *self.last_query.write() = Some(canonical);

        self.dispatch(self.build_request()).await?;
        Ok(true)
    }

    /// Builds the request payload from the current facets.
    ///
    /// Static params live in their own field of the payload, so they can
    /// never override the pagination or sort the facets derived.
    fn build_request(&self) -> FetchRequest {
        let (limit, offset) = self.pagination.read().limit_offset();
        let mut params = self.options.static_params.clone();
        if let Some(overview) = &self.options.location_overview {
            if !overview.is_empty() {
                params.insert("location".to_string(), overview.clone());
            }
        }
        FetchRequest {
            limit,
            offset,
            sort: self.sort.read().clone(),
            filters: self.filters.read().clone(),
            params,
        }
    }

    /// Issues a fetch tagged with the next request id and applies its
    /// result under the last-request-wins rule.
    async fn dispatch(&self, mut request: FetchRequest) -> EngineResult<S::Collection> {
        let request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        self.loading.set(true);
        self.stats.write().fetches_issued += 1;
        tracing::debug!(request_id, "issuing fetch");

        if let Some(lookup) = &self.lookup {
            if let Some(filters) = request.filters.clone() {
                match lookup.resolve(filters).await {
                    Ok(resolved) => request.filters = Some(resolved),
                    Err(error) => {
                        tracing::warn!(error = %error, "filter lookup failed, keeping unresolved filters");
                    }
                }
            }
        }

        let result = self.source.fetch(&request).await;

        if self.latest_request.load(Ordering::SeqCst) == request_id {
            match &result {
                Ok(collection) => {
                    self.state.set(collection.clone());
                    self.stats.write().fetches_applied += 1;
                }
                Err(error) => {
                    self.stats.write().fetches_failed += 1;
                    tracing::debug!(request_id, error = %error, "fetch failed");
                }
            }
            self.loading.set(false);
        } else {
            self.stats.write().fetches_superseded += 1;
            tracing::debug!(request_id, "fetch superseded, discarding result");
        }

        result
    }
}
