//! Data-source abstraction.
//!
//! A data source performs the actual backend fetch for one entity type. The
//! engine builds a canonical [`FetchRequest`] from its reconciled facets and
//! hands it to the source; the source translates it into whatever its
//! backend speaks and returns the entity's collection shape.

use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use pagesync_query::{Collection, FilterState, SortSpec};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// The canonical request payload, constructed fresh from the current facets
/// at fetch time and immutable per invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchRequest {
    /// Maximum number of rows requested.
    pub limit: i64,
    /// Number of rows to skip.
    pub offset: i64,
    /// The active sort specification.
    pub sort: SortSpec,
    /// Validated filters; absent for entities without a filter schema.
    pub filters: Option<FilterState>,
    /// Caller-fixed static parameters (e.g. a location-overview scope).
    /// Never override pagination or sort.
    pub params: BTreeMap<String, String>,
}

impl FetchRequest {
    /// Returns a static parameter by key.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns the value of a single-valued filter by key.
    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters
            .as_ref()
            .and_then(|f| f.get(key))
            .and_then(|v| v.values().first().copied())
    }
}

/// A data source fetches one entity type's collection.
///
/// Implementations must be side-effect-free with respect to engine state;
/// their only contract is to return a collection or reject. Timeouts and
/// retries are the source's own business.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// One row of the collection.
    type Entry: Send;
    /// The collection shape this entity's backend returns.
    type Collection: Clone + Send;

    /// Performs the fetch for the given request.
    async fn fetch(&self, request: &FetchRequest) -> EngineResult<Self::Collection>;

    /// The default-empty collection shown before the first successful fetch.
    ///
    /// Supplied by the entity because the empty shape's extension fields are
    /// entity-specific.
    fn empty_collection(&self) -> Self::Collection;
}

#[async_trait]
impl<S: DataSource + ?Sized> DataSource for std::sync::Arc<S> {
    type Entry = S::Entry;
    type Collection = S::Collection;

    async fn fetch(&self, request: &FetchRequest) -> EngineResult<Self::Collection> {
        (**self).fetch(request).await
    }

    fn empty_collection(&self) -> Self::Collection {
        (**self).empty_collection()
    }
}

/// An in-memory data source serving pages out of a fixed row set.
///
/// Used in tests and as the reference implementation of the limit/offset
/// contract. Records the last request it served so assertions can inspect
/// the payload the engine actually built.
pub struct MemorySource<T> {
    rows: Vec<T>,
    last_request: RwLock<Option<FetchRequest>>,
    fail: AtomicBool,
}

impl<T: Clone + Send + Sync> MemorySource<T> {
    /// Creates a source over the given rows.
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows,
            last_request: RwLock::new(None),
            fail: AtomicBool::new(false),
        }
    }

    /// Makes subsequent fetches reject.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Returns the most recent request served.
    pub fn last_request(&self) -> Option<FetchRequest> {
        self.last_request.read().clone()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> DataSource for MemorySource<T> {
    type Entry = T;
    type Collection = Collection<T>;

    async fn fetch(&self, request: &FetchRequest) -> EngineResult<Self::Collection> {
        *self.last_request.write() = Some(request.clone());

        if self.fail.load(Ordering::SeqCst) {
            return Err(EngineError::source_fatal("memory source set to fail"));
        }

        let offset = request.offset.max(0) as usize;
        let limit = request.limit.max(0) as usize;
        let data: Vec<T> = self.rows.iter().skip(offset).take(limit).cloned().collect();
        let total = self.rows.len() as i64;

        Ok(Collection::new(data, total, request.limit, total))
    }

    fn empty_collection(&self) -> Self::Collection {
        Collection::empty()
    }
}
