//! Entity fixtures and fixture data sources.
//!
//! Two entity types cover the engine's two configurations: trades carry a
//! filter schema and static params, exchange-savings events have no schema
//! but an extended collection shape with aggregate fields.

use async_trait::async_trait;
use pagesync_engine::{DataSource, EngineError, EngineResult, FetchRequest};
use pagesync_query::{Collection, FilterSchema, MatcherDef, UNBOUNDED_LIMIT};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::oneshot;

/// Number of trade rows in the fixture set.
pub const TRADE_TOTAL: usize = 210;

/// Number of savings rows in the fixture set.
pub const SAVINGS_TOTAL: usize = 260;

/// A closed trade row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeEntry {
    /// Backend identifier of the trade.
    pub trade_id: String,
    /// Unix timestamp of execution.
    pub timestamp: i64,
    /// Exchange the trade happened on.
    pub location: String,
    /// Bought/sold asset.
    pub base_asset: String,
    /// Asset the trade was priced in.
    pub quote_asset: String,
    /// Trade side, `buy` or `sell`.
    pub trade_type: String,
    /// Traded amount, decimal string.
    pub amount: String,
    /// Execution rate, decimal string.
    pub rate: String,
}

/// Generates the deterministic trade fixture rows.
pub fn trade_rows() -> Vec<TradeEntry> {
    let locations = ["kraken", "binance", "coinbase"];
    let assets = ["BTC", "ETH", "DOT"];
    (0..TRADE_TOTAL)
        .map(|i| TradeEntry {
            trade_id: format!("trade-{i:04}"),
            timestamp: 1_600_000_000 + i as i64 * 3600,
            location: locations[i % locations.len()].to_string(),
            base_asset: assets[i % assets.len()].to_string(),
            quote_asset: "USD".to_string(),
            trade_type: if i % 2 == 0 { "buy" } else { "sell" }.to_string(),
            amount: format!("{}.5", i % 9 + 1),
            rate: format!("{}", 20_000 + i),
        })
        .collect()
}

/// Filter schema for the trade fixtures.
#[derive(Debug, Clone, Copy, Default)]
pub struct TradeFilterSchema;

impl FilterSchema for TradeFilterSchema {
    fn matchers(&self) -> Vec<MatcherDef> {
        vec![
            MatcherDef::any("location", "exchange the trade happened on"),
            MatcherDef::any("asset", "traded asset").with_multiple(),
            MatcherDef::enumerated("action", "trade side", ["buy", "sell"]),
            MatcherDef::enumerated(
                "includeIgnoredTrades",
                "include trades marked as ignored",
                ["true", "false"],
            ),
        ]
    }

    fn free_text_key(&self) -> Option<&str> {
        Some("search")
    }
}

/// A fixture backend serving trade pages.
///
/// Mirrors an API that applies pagination upstream and reports no cap of its
/// own: pages honor the requested limit/offset while the returned `limit`
/// stays unbounded. The `location` filter narrows `found`.
pub struct TradeSource {
    rows: Vec<TradeEntry>,
}

impl TradeSource {
    /// Creates a source over the full fixture set.
    pub fn new() -> Self {
        Self { rows: trade_rows() }
    }
}

impl Default for TradeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for TradeSource {
    type Entry = TradeEntry;
    type Collection = Collection<TradeEntry>;

    async fn fetch(&self, request: &FetchRequest) -> EngineResult<Self::Collection> {
        let matching: Vec<&TradeEntry> = self
            .rows
            .iter()
            .filter(|row| match request.filter("location") {
                Some(location) => row.location == location,
                None => true,
            })
            .collect();

        let offset = request.offset.max(0) as usize;
        let limit = request.limit.max(0) as usize;
        let data: Vec<TradeEntry> = matching
            .iter()
            .skip(offset)
            .take(limit)
            .map(|row| (*row).clone())
            .collect();

        Ok(Collection::new(
            data,
            matching.len() as i64,
            UNBOUNDED_LIMIT,
            self.rows.len() as i64,
        ))
    }

    fn empty_collection(&self) -> Self::Collection {
        Collection::empty()
    }
}

/// An exchange-savings interest event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsEvent {
    /// Unix timestamp of the payout.
    pub timestamp: i64,
    /// Exchange paying the interest.
    pub location: String,
    /// Asset the interest was paid in.
    pub asset: String,
    /// Paid amount, decimal string.
    pub amount: String,
    /// USD value at payout time, decimal string.
    pub usd_value: String,
}

/// Total received per asset, an aggregate the savings backend returns
/// alongside the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedAmount {
    /// Asset the interest was paid in.
    pub asset: String,
    /// Summed amount, decimal string.
    pub amount: String,
    /// Summed USD value, decimal string.
    pub usd_value: String,
}

/// The savings backend's extended collection shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsCollection {
    /// The entries of the current page.
    pub data: Vec<SavingsEvent>,
    /// Number of rows matching the request.
    pub found: i64,
    /// Cap the backend applied, or [`UNBOUNDED_LIMIT`].
    pub limit: i64,
    /// Number of rows disregarding filters.
    pub total: i64,
    /// Summed USD value over all matching rows, decimal string.
    pub total_usd_value: String,
    /// Distinct assets over all matching rows.
    pub assets: Vec<String>,
    /// Per-asset received totals.
    pub received: Vec<ReceivedAmount>,
}

impl SavingsCollection {
    /// The default-empty savings collection.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            found: 0,
            limit: UNBOUNDED_LIMIT,
            total: 0,
            total_usd_value: "0".to_string(),
            assets: Vec::new(),
            received: Vec::new(),
        }
    }
}

/// Generates the deterministic savings fixture rows, alternating between two
/// assets.
pub fn savings_rows() -> Vec<SavingsEvent> {
    let assets = ["BNB", "DOT"];
    (0..SAVINGS_TOTAL)
        .map(|i| SavingsEvent {
            timestamp: 1_620_000_000 + i as i64 * 86_400,
            location: "binance".to_string(),
            asset: assets[i % assets.len()].to_string(),
            amount: "0.01".to_string(),
            usd_value: "2.5".to_string(),
        })
        .collect()
}

/// A fixture backend serving savings pages with aggregate fields.
pub struct SavingsSource {
    rows: Vec<SavingsEvent>,
}

impl SavingsSource {
    /// Creates a source over the full fixture set.
    pub fn new() -> Self {
        Self {
            rows: savings_rows(),
        }
    }
}

impl Default for SavingsSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for SavingsSource {
    type Entry = SavingsEvent;
    type Collection = SavingsCollection;

    async fn fetch(&self, request: &FetchRequest) -> EngineResult<Self::Collection> {
        let offset = request.offset.max(0) as usize;
        let limit = request.limit.max(0) as usize;
        let data: Vec<SavingsEvent> =
            self.rows.iter().skip(offset).take(limit).cloned().collect();

        let mut assets: Vec<String> = Vec::new();
        for row in &self.rows {
            if !assets.contains(&row.asset) {
                assets.push(row.asset.clone());
            }
        }
        let received: Vec<ReceivedAmount> = assets
            .iter()
            .map(|asset| {
                let count = self.rows.iter().filter(|r| &r.asset == asset).count();
                ReceivedAmount {
                    asset: asset.clone(),
                    amount: format!("{}", count as f64 * 0.01),
                    usd_value: format!("{}", count as f64 * 2.5),
                }
            })
            .collect();

        Ok(SavingsCollection {
            data,
            found: self.rows.len() as i64,
            limit: UNBOUNDED_LIMIT,
            total: self.rows.len() as i64,
            total_usd_value: format!("{}", self.rows.len() as f64 * 2.5),
            assets,
            received,
        })
    }

    fn empty_collection(&self) -> Self::Collection {
        SavingsCollection::empty()
    }
}

/// A data source whose responses resolve only when the test says so.
///
/// Each queued response hands back a sender; fetches consume the queue in
/// order and suspend until their sender fires. Resolving senders out of
/// order drives the interleavings the supersession rule has to survive.
pub struct ManualSource<C> {
    gates: Mutex<VecDeque<oneshot::Receiver<EngineResult<C>>>>,
    empty: C,
}

impl<C: Clone + Send + Sync> ManualSource<C> {
    /// Creates a source with the given default-empty collection.
    pub fn new(empty: C) -> Self {
        Self {
            gates: Mutex::new(VecDeque::new()),
            empty,
        }
    }

    /// Queues one response slot and returns the sender that resolves it.
    pub fn queue(&self) -> oneshot::Sender<EngineResult<C>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().push_back(rx);
        tx
    }

    /// Returns the number of unconsumed response slots.
    pub fn queued(&self) -> usize {
        self.gates.lock().len()
    }
}

#[async_trait]
impl<C: Clone + Send + Sync> DataSource for ManualSource<C> {
    type Entry = C;
    type Collection = C;

    async fn fetch(&self, _request: &FetchRequest) -> EngineResult<Self::Collection> {
        let gate = self
            .gates
            .lock()
            .pop_front()
            .ok_or_else(|| EngineError::source_fatal("no queued response"))?;

        gate.await
            .map_err(|_| EngineError::source_fatal("manual response dropped"))?
    }

    fn empty_collection(&self) -> Self::Collection {
        self.empty.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(limit: i64, offset: i64) -> FetchRequest {
        FetchRequest {
            limit,
            offset,
            ..FetchRequest::default()
        }
    }

    #[tokio::test]
    async fn trade_source_pages_and_counts() {
        let source = TradeSource::new();
        let page = source.fetch(&request(10, 0)).await.unwrap();

        assert_eq!(page.data.len(), 10);
        assert_eq!(page.found, TRADE_TOTAL as i64);
        assert_eq!(page.total, TRADE_TOTAL as i64);
        assert_eq!(page.limit, UNBOUNDED_LIMIT);
    }

    #[tokio::test]
    async fn trade_source_applies_location_filter() {
        let source = TradeSource::new();
        let mut req = request(10, 0);
        let filters: pagesync_query::FilterState =
            [("location", "kraken")].into_iter().collect();
        req.filters = Some(filters);

        let page = source.fetch(&req).await.unwrap();
        assert_eq!(page.found, 70);
        assert_eq!(page.total, TRADE_TOTAL as i64);
        assert!(page.data.iter().all(|t| t.location == "kraken"));
    }

    #[tokio::test]
    async fn savings_source_returns_aggregates() {
        let source = SavingsSource::new();
        let page = source.fetch(&request(10, 0)).await.unwrap();

        assert_eq!(page.data.len(), 10);
        assert_eq!(page.found, SAVINGS_TOTAL as i64);
        assert_eq!(page.assets.len(), 2);
        assert_eq!(page.received.len(), 2);
    }

    #[tokio::test]
    async fn manual_source_resolves_when_told() {
        let source: ManualSource<Collection<u32>> = ManualSource::new(Collection::empty());
        let tx = source.queue();
        assert_eq!(source.queued(), 1);

        let req = request(10, 0);
        let fetch = source.fetch(&req);
        tx.send(Ok(Collection::new(vec![1], 1, UNBOUNDED_LIMIT, 1)))
            .ok();

        let collection = fetch.await.unwrap();
        assert_eq!(collection.total, 1);
        assert_eq!(source.queued(), 0);
    }

    #[tokio::test]
    async fn manual_source_without_queue_rejects() {
        let source: ManualSource<Collection<u32>> = ManualSource::new(Collection::empty());
        assert!(source.fetch(&request(10, 0)).await.is_err());
    }

    #[test]
    fn trade_serde_uses_camel_case() {
        let trade = &trade_rows()[0];
        let json = serde_json::to_value(trade).unwrap();
        assert!(json.get("tradeId").is_some());
        assert!(json.get("baseAsset").is_some());
    }
}
