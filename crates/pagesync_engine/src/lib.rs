//! # PageSync Engine
//!
//! Pagination/filter/fetch synchronization engine for PageSync.
//!
//! This crate provides:
//! - [`FetchEngine`]: facet state (sort, filters, pagination) synchronized
//!   with a navigable location and fetched through an injected data source
//! - Last-request-wins supersession for overlapping fetches
//! - Observable cells for the result collection, loading flag, and
//!   user-action flag
//! - Injectable capability traits for the data source, the location
//!   navigator, and asynchronous filter lookups, with in-memory
//!   implementations for tests
//!
//! ## Architecture
//!
//! The navigable location is the source of truth when synchronization is
//! enabled: an external address change deterministically reproduces the same
//! request parameters, and the engine mirrors every UI-originated facet
//! change back into the location before fetching.
//!
//! ## Key Invariants
//!
//! - Only the newest issued request may write the result state or clear the
//!   loading flag; earlier responses are discarded silently
//! - A canonical query equal to the engine's last push never re-triggers a
//!   push or a fetch (value-equality suppression, not call counting)
//! - Filter or sort changes reset pagination to page 1 before the next
//!   fetch; pure page navigation never resets other facets
//! - A failed fetch leaves the previously displayed collection untouched

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cell;
mod config;
mod engine;
mod error;
mod navigator;
mod source;

pub use cell::Cell;
pub use config::{EngineOptions, HistoryMode};
pub use engine::{FetchEngine, FetchStats, FilterLookup};
pub use error::{EngineError, EngineResult};
pub use navigator::{LocationNavigator, MockNavigator};
pub use source::{DataSource, FetchRequest, MemorySource};
