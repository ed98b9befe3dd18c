//! Client abstraction for fetching market data from the remote API

use crate::{
    error::MarketError,
    types::{CoinDetail, CoinListQuery, CoinSummary, PricePoint},
};
use async_trait::async_trait;

/// Trait for market-data clients
///
/// Implementations translate typed requests into calls against a
/// market-data source (CoinGecko in production, a mock in tests). Every
/// method is an independent, cancellable request; dropping the future
/// abandons it. Implementations are stateless apart from any
/// transport-level cache and safe to call concurrently.
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    /// Fetches one page of the market listing
    ///
    /// # Arguments
    /// * `query` - Quote currency, sort order and paging for the listing
    ///
    /// # Returns
    /// At most `query.per_page` coin summaries, or an error if the fetch
    /// or decode fails
    async fn list_coins(&self, query: &CoinListQuery) -> Result<Vec<CoinSummary>, MarketError>;

    /// Fetches the full detail for a single coin
    ///
    /// # Arguments
    /// * `id` - The coin id, e.g. "bitcoin"
    ///
    /// # Returns
    /// The coin detail, `NotFound` when the remote does not know the id
    async fn coin_detail(&self, id: &str) -> Result<CoinDetail, MarketError>;

    /// Fetches chart samples for a lookback window
    ///
    /// `days` is forwarded to the remote as given. Values outside the
    /// windows the screens offer are server-defined, not rejected here.
    async fn market_chart(
        &self,
        id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>, MarketError>;

    /// Returns the name of this data source
    fn source_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock market-data client for testing
    ///
    /// Responses are preloaded per coin id; every call is appended to a
    /// log so tests can assert call order.
    pub struct MockMarketApi {
        coins: Mutex<Option<Result<Vec<CoinSummary>, MarketError>>>,
        details: Mutex<HashMap<String, Result<CoinDetail, MarketError>>>,
        charts: Mutex<HashMap<String, Result<Vec<PricePoint>, MarketError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl Default for MockMarketApi {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockMarketApi {
        pub fn new() -> Self {
            Self {
                coins: Mutex::new(None),
                details: Mutex::new(HashMap::new()),
                charts: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn set_coins(&self, coins: Vec<CoinSummary>) {
            *self.coins.lock().unwrap() = Some(Ok(coins));
        }

        pub fn set_coins_error(&self, error: MarketError) {
            *self.coins.lock().unwrap() = Some(Err(error));
        }

        pub fn set_detail(&self, detail: CoinDetail) {
            let id = detail.id.clone();
            self.details.lock().unwrap().insert(id, Ok(detail));
        }

        pub fn set_detail_error(&self, id: &str, error: MarketError) {
            self.details.lock().unwrap().insert(id.to_string(), Err(error));
        }

        pub fn set_chart(&self, id: &str, chart: Vec<PricePoint>) {
            self.charts.lock().unwrap().insert(id.to_string(), Ok(chart));
        }

        pub fn set_chart_error(&self, id: &str, error: MarketError) {
            self.charts.lock().unwrap().insert(id.to_string(), Err(error));
        }

        /// All calls made so far, in order
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    /// Manual "clone" of MarketError since it doesn't implement Clone
    pub fn clone_error(error: &MarketError) -> MarketError {
        match error {
            MarketError::Network(e) => {
                MarketError::api(0, format!("Network error (cloned): {}", e))
            }
            MarketError::Decode { reason } => MarketError::decode(reason.clone()),
            MarketError::NotFound { id } => MarketError::not_found(id.clone()),
            MarketError::RateLimited => MarketError::RateLimited,
            MarketError::Api { status, body } => MarketError::api(*status, body.clone()),
        }
    }

    #[async_trait]
    impl MarketDataApi for MockMarketApi {
        async fn list_coins(
            &self,
            query: &CoinListQuery,
        ) -> Result<Vec<CoinSummary>, MarketError> {
            self.record(format!(
                "list_coins:{}:{}:{}",
                query.vs_currency, query.per_page, query.page
            ));
            let coins = self.coins.lock().unwrap();
            match coins.as_ref() {
                Some(Ok(coins)) => Ok(coins.clone()),
                Some(Err(err)) => Err(clone_error(err)),
                None => Ok(Vec::new()),
            }
        }

        async fn coin_detail(&self, id: &str) -> Result<CoinDetail, MarketError> {
            self.record(format!("coin_detail:{}", id));
            let details = self.details.lock().unwrap();
            match details.get(id) {
                Some(Ok(detail)) => Ok(detail.clone()),
                Some(Err(err)) => Err(clone_error(err)),
                None => Err(MarketError::not_found(id)),
            }
        }

        async fn market_chart(
            &self,
            id: &str,
            vs_currency: &str,
            days: u32,
        ) -> Result<Vec<PricePoint>, MarketError> {
            self.record(format!("market_chart:{}:{}:{}", id, vs_currency, days));
            let charts = self.charts.lock().unwrap();
            match charts.get(id) {
                Some(Ok(chart)) => Ok(chart.clone()),
                Some(Err(err)) => Err(clone_error(err)),
                None => Err(MarketError::not_found(id)),
            }
        }

        fn source_name(&self) -> &'static str {
            "mock"
        }
    }
}
