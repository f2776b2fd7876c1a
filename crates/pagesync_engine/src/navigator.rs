//! Location-navigation abstraction.
//!
//! The engine never talks to a concrete router. It reads and writes the
//! navigable location through this trait, so hosts plug in their own router
//! integration and tests supply [`MockNavigator`] without any substitution
//! mechanism.

use pagesync_query::LocationQuery;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// A location navigator reads the current location query and pushes new ones.
///
/// Implementations must preserve keys the engine does not own; the engine
/// itself only ever rewrites its owned key set on the queries it pushes.
pub trait LocationNavigator: Send + Sync {
    /// Returns the current location query.
    fn current_query(&self) -> LocationQuery;

    /// Pushes a new location query. Returns false if the host rejected the
    /// navigation; the engine then keeps its in-memory facet state
    /// authoritative.
    fn push_query(&self, query: LocationQuery) -> bool;
}

impl<N: LocationNavigator + ?Sized> LocationNavigator for std::sync::Arc<N> {
    fn current_query(&self) -> LocationQuery {
        (**self).current_query()
    }

    fn push_query(&self, query: LocationQuery) -> bool {
        (**self).push_query(query)
    }
}

/// An in-memory navigator for tests and history-less hosts.
#[derive(Debug)]
pub struct MockNavigator {
    query: RwLock<LocationQuery>,
    pushes: RwLock<Vec<LocationQuery>>,
    accept: AtomicBool,
}

impl MockNavigator {
    /// Creates a navigator with an empty location query.
    pub fn new() -> Self {
        Self::with_query(LocationQuery::new())
    }

    /// Creates a navigator with the given initial query.
    pub fn with_query(query: LocationQuery) -> Self {
        Self {
            query: RwLock::new(query),
            pushes: RwLock::new(Vec::new()),
            accept: AtomicBool::new(true),
        }
    }

    /// Replaces the current query without recording a push, simulating an
    /// external navigation.
    pub fn set_query(&self, query: LocationQuery) {
        *self.query.write() = query;
    }

    /// Makes subsequent pushes succeed or fail.
    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    /// Returns the number of pushes attempted so far.
    pub fn push_count(&self) -> usize {
        self.pushes.read().len()
    }

    /// Returns the most recently pushed query.
    pub fn last_push(&self) -> Option<LocationQuery> {
        self.pushes.read().last().cloned()
    }
}

impl Default for MockNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationNavigator for MockNavigator {
    fn current_query(&self) -> LocationQuery {
        self.query.read().clone()
    }

    fn push_query(&self, query: LocationQuery) -> bool {
        self.pushes.write().push(query.clone());
        if self.accept.load(Ordering::SeqCst) {
            *self.query.write() = query;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_updates_current_query() {
        let navigator = MockNavigator::new();
        let query: LocationQuery = [("sortBy", vec!["type"])].into_iter().collect();

        assert!(navigator.push_query(query.clone()));
        assert_eq!(navigator.current_query(), query);
        assert_eq!(navigator.push_count(), 1);
        assert_eq!(navigator.last_push(), Some(query));
    }

    #[test]
    fn rejected_push_leaves_query_untouched() {
        let initial: LocationQuery = [("tab", "history")].into_iter().collect();
        let navigator = MockNavigator::with_query(initial.clone());
        navigator.set_accept(false);

        let attempted: LocationQuery = [("page", "2")].into_iter().collect();
        assert!(!navigator.push_query(attempted));
        assert_eq!(navigator.current_query(), initial);
        // The attempt is still recorded.
        assert_eq!(navigator.push_count(), 1);
    }

    #[test]
    fn external_navigation_is_not_a_push() {
        let navigator = MockNavigator::new();
        let query: LocationQuery = [("page", "3")].into_iter().collect();

        navigator.set_query(query.clone());
        assert_eq!(navigator.current_query(), query);
        assert_eq!(navigator.push_count(), 0);
    }
}
