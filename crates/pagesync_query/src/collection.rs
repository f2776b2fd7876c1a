//! The uniform collection shape returned by backends.

use serde::{Deserialize, Serialize};

/// Sentinel `limit` value meaning "no pagination cap applied, all matching
/// rows returned". Also the value a collection carries before any fetch has
/// populated it.
pub const UNBOUNDED_LIMIT: i64 = -1;

/// A page of entries together with the backend's counts.
///
/// `found` is the number of rows matching the active filters, `total` the
/// number of rows without filters. Entity-specific extensions (aggregate
/// fields and the like) live in their own structs wrapping or mirroring this
/// shape; the engine treats collections opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection<T> {
    /// The entries of the current page.
    pub data: Vec<T>,
    /// Number of rows matching the active filters.
    pub found: i64,
    /// Cap the backend applied, or [`UNBOUNDED_LIMIT`].
    pub limit: i64,
    /// Number of rows disregarding filters.
    pub total: i64,
}

impl<T> Collection<T> {
    /// Creates a collection from a page of entries and counts.
    pub fn new(data: Vec<T>, found: i64, limit: i64, total: i64) -> Self {
        Self {
            data,
            found,
            limit,
            total,
        }
    }

    /// The default-empty collection shown before the first successful fetch.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            found: 0,
            limit: UNBOUNDED_LIMIT,
            total: 0,
        }
    }

    /// Checks the `data.len() <= limit` invariant; an unbounded limit
    /// accepts any length.
    pub fn respects_limit(&self) -> bool {
        self.limit < 0 || self.data.len() as i64 <= self.limit
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_shape() {
        let collection: Collection<u32> = Collection::empty();
        assert!(collection.data.is_empty());
        assert_eq!(collection.found, 0);
        assert_eq!(collection.total, 0);
        assert_eq!(collection.limit, UNBOUNDED_LIMIT);
        assert!(collection.respects_limit());
    }

    #[test]
    fn limit_invariant() {
        let capped = Collection::new(vec![1, 2, 3], 10, 3, 10);
        assert!(capped.respects_limit());

        let overfull = Collection::new(vec![1, 2, 3], 10, 2, 10);
        assert!(!overfull.respects_limit());

        let unbounded = Collection::new(vec![1, 2, 3], 3, UNBOUNDED_LIMIT, 3);
        assert!(unbounded.respects_limit());
    }

    #[test]
    fn serde_uses_camel_case() {
        let collection = Collection::new(vec![1], 1, UNBOUNDED_LIMIT, 1);
        let json = serde_json::to_string(&collection).unwrap();
        assert_eq!(json, r#"{"data":[1],"found":1,"limit":-1,"total":1}"#);
    }
}
