//! Sort reconciliation.
//!
//! Normalizes a sort specification between its in-memory form (an ordered
//! list of column/direction entries) and its serialized query form (parallel
//! `sortBy`/`sortDesc` sequences). Unknown columns are dropped, entries past
//! the declared multi-sort limit are truncated, and an empty result falls
//! back to the entity's default sort.

use crate::query::LocationQuery;
use serde::{Deserialize, Serialize};

/// Query key carrying the sorted column names.
pub const SORT_BY_KEY: &str = "sortBy";

/// Query key carrying the per-column descending flags.
pub const SORT_DESC_KEY: &str = "sortDesc";

/// Direction of a sort column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns the canonical string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Parses a direction, defaulting to ascending on unknown input.
    pub fn from_str(value: &str) -> Self {
        match value {
            "desc" => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    /// Returns true for ascending order.
    pub fn is_ascending(&self) -> bool {
        matches!(self, SortDirection::Asc)
    }
}

/// One sorted column with its direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortEntry {
    /// Column key, a member of the entity's sortable-column set.
    pub column: String,
    /// Sort direction for the column.
    pub direction: SortDirection,
}

impl SortEntry {
    /// Creates an ascending entry.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Creates a descending entry.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Per-entity sort configuration: the sortable-column set, the multi-sort
/// limit, and the default entry applied when nothing valid is supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOptions {
    columns: Vec<String>,
    max_entries: usize,
    default: SortEntry,
}

impl SortOptions {
    /// Creates options over the given sortable columns with the given
    /// default entry. An empty column set accepts any column key.
    pub fn new<I, S>(columns: I, default: SortEntry) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            max_entries: 1,
            default,
        }
    }

    /// Sets the number of simultaneous sort columns supported.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Returns the default entry.
    pub fn default_entry(&self) -> &SortEntry {
        &self.default
    }

    /// Returns the multi-sort limit.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Returns true if `column` belongs to the sortable set.
    pub fn is_known(&self, column: &str) -> bool {
        self.columns.is_empty() || self.columns.iter().any(|c| c == column)
    }
}

impl Default for SortOptions {
    fn default() -> Self {
        Self::new(Vec::<String>::new(), SortEntry::asc("timestamp"))
    }
}

/// An ordered sort specification.
///
/// Holds at least one entry once a default has been applied; constructors
/// going through [`SortSpec::from_query`] or [`SortOptions`] normalization
/// guarantee that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec(Vec<SortEntry>);

impl SortSpec {
    /// Creates a spec from entries, without normalization.
    pub fn new(entries: Vec<SortEntry>) -> Self {
        Self(entries)
    }

    /// Creates a single-entry spec.
    pub fn single(entry: SortEntry) -> Self {
        Self(vec![entry])
    }

    /// Returns the entries in order.
    pub fn entries(&self) -> &[SortEntry] {
        &self.0
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no entries are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reconciles the serialized query form into a spec.
    ///
    /// Accepts zero, one, or many `sortBy`/`sortDesc` pairs. A missing
    /// `sortDesc` slot defaults the pair to ascending; unknown columns are
    /// dropped; pairs past the multi-sort limit are truncated; an empty
    /// result falls back to the default entry.
    pub fn from_query(query: &LocationQuery, options: &SortOptions) -> Self {
        let columns = query.values(SORT_BY_KEY);
        let descending = query.values(SORT_DESC_KEY);

        let entries: Vec<SortEntry> = columns
            .iter()
            .enumerate()
            .filter(|(_, column)| options.is_known(column))
            .map(|(i, column)| SortEntry {
                column: (*column).to_string(),
                direction: if descending.get(i).copied() == Some("true") {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                },
            })
            .take(options.max_entries())
            .collect();

        Self(entries).or_default(options)
    }

    /// Serializes into the `sortBy`/`sortDesc` query fragment.
    ///
    /// The two sequences are always parallel and of equal length.
    pub fn to_query(&self) -> LocationQuery {
        let mut query = LocationQuery::new();
        if self.0.is_empty() {
            return query;
        }
        let columns: Vec<String> = self.0.iter().map(|e| e.column.clone()).collect();
        let descending: Vec<String> = self
            .0
            .iter()
            .map(|e| (!e.direction.is_ascending()).to_string())
            .collect();
        query.insert(SORT_BY_KEY, columns);
        query.insert(SORT_DESC_KEY, descending);
        query
    }

    /// Normalizes against `options`: drops unknown columns, truncates past
    /// the multi-sort limit, and falls back to the default entry when
    /// nothing valid remains.
    pub fn normalize(self, options: &SortOptions) -> Self {
        let entries: Vec<SortEntry> = self
            .0
            .into_iter()
            .filter(|e| options.is_known(&e.column))
            .take(options.max_entries())
            .collect();
        Self(entries).or_default(options)
    }

    fn or_default(self, options: &SortOptions) -> Self {
        if self.0.is_empty() {
            Self(vec![options.default_entry().clone()])
        } else {
            self
        }
    }
}

impl IntoIterator for SortSpec {
    type Item = SortEntry;
    type IntoIter = std::vec::IntoIter<SortEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
