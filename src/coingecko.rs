//! CoinGecko market-data client implementation

use crate::{
    client::MarketDataApi,
    constants::{
        COINGECKO_API_URL, COINGECKO_COINS_ENDPOINT, COINGECKO_MARKETS_ENDPOINT,
        REQUEST_TIMEOUT_SECS, RESPONSE_CACHE_TTL_SECS, USER_AGENT,
    },
    error::MarketError,
    types::{CoinDetail, CoinListQuery, CoinSummary, PricePoint},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// CoinGecko chart response: rows of [timestamp-ms, price]
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<(f64, f64)>,
}

/// Cache of raw response bodies keyed by request URL
///
/// Stands in for the 30-second `Cache-Control` override the app puts on
/// market-data responses. Fresh entries are served from memory; anything
/// past its TTL is refetched and swept out on the next insert. Safe for
/// concurrent reads.
struct ResponseCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
    ttl: Duration,
}

impl ResponseCache {
    fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    async fn get(&self, url: &str) -> Option<String> {
        let entries = self.entries.read().await;
        if let Some((body, stored_at)) = entries.get(url) {
            if stored_at.elapsed() < self.ttl {
                return Some(body.clone());
            }
        }
        None
    }

    async fn insert(&self, url: String, body: String) {
        let mut entries = self.entries.write().await;
        // Expired entries can never be served again; drop them so the
        // map stays bounded by the URLs fetched within one TTL window
        entries.retain(|_, (_, stored_at)| stored_at.elapsed() < self.ttl);
        entries.insert(url, (body, Instant::now()));
    }
}

/// CoinGecko market-data client
///
/// Stateless apart from the response cache; safe to call concurrently.
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    cache: ResponseCache,
}

impl CoinGeckoClient {
    /// Creates a client against the public CoinGecko API
    pub fn new() -> Result<Self, MarketError> {
        Self::with_base_url(COINGECKO_API_URL)
    }

    /// Creates a client against a non-default endpoint, e.g. a local test server
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, MarketError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(MarketError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            cache: ResponseCache::new(Duration::from_secs(RESPONSE_CACHE_TTL_SECS)),
        })
    }

    /// Builds the URL for one page of the market listing
    fn markets_url(&self, query: &CoinListQuery) -> String {
        format!(
            "{}{}?vs_currency={}&order={}&per_page={}&page={}&sparkline={}",
            self.base_url,
            COINGECKO_MARKETS_ENDPOINT,
            query.vs_currency,
            query.order.as_str(),
            query.per_page,
            query.page,
            query.sparkline
        )
    }

    /// Builds the URL for a coin detail lookup
    fn detail_url(&self, id: &str) -> String {
        format!(
            "{}{}/{}?localization=false&tickers=false&market_data=true&community_data=false&developer_data=false&sparkline=true",
            self.base_url, COINGECKO_COINS_ENDPOINT, id
        )
    }

    /// Builds the URL for a market chart lookup
    ///
    /// `days` goes out as given; out-of-range values are server-defined.
    fn chart_url(&self, id: &str, vs_currency: &str, days: u32) -> String {
        format!(
            "{}{}/{}/market_chart?vs_currency={}&days={}",
            self.base_url, COINGECKO_COINS_ENDPOINT, id, vs_currency, days
        )
    }

    /// Fetches a response body, serving it from the cache while fresh
    ///
    /// `resource` names what a 404 refers to in the resulting error.
    async fn fetch_body(&self, url: &str, resource: &str) -> Result<String, MarketError> {
        if let Some(body) = self.cache.get(url).await {
            log::debug!("Serving cached response for {}", url);
            return Ok(body);
        }

        log::debug!("Fetching from CoinGecko: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(MarketError::Network)?;

        if response.status().as_u16() == 404 {
            return Err(MarketError::not_found(resource));
        }

        // Check for rate limiting
        if response.status().as_u16() == 429 {
            return Err(MarketError::RateLimited);
        }

        // Check for other errors
        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(MarketError::api(
                status,
                response.text().await.unwrap_or_default(),
            ));
        }

        let body = response.text().await.map_err(MarketError::Network)?;
        self.cache.insert(url.to_string(), body.clone()).await;

        Ok(body)
    }
}

fn decode_markets(body: &str) -> Result<Vec<CoinSummary>, MarketError> {
    serde_json::from_str(body).map_err(|e| {
        MarketError::decode(format!(
            "Failed to parse market listing: {}. Response: {}",
            e, body
        ))
    })
}

fn decode_detail(body: &str) -> Result<CoinDetail, MarketError> {
    serde_json::from_str(body).map_err(|e| {
        MarketError::decode(format!(
            "Failed to parse coin detail: {}. Response: {}",
            e, body
        ))
    })
}

fn decode_chart(body: &str) -> Result<Vec<PricePoint>, MarketError> {
    let response: MarketChartResponse = serde_json::from_str(body).map_err(|e| {
        MarketError::decode(format!(
            "Failed to parse market chart: {}. Response: {}",
            e, body
        ))
    })?;

    Ok(response
        .prices
        .into_iter()
        .map(|(timestamp, price)| PricePoint::new(timestamp as i64, price))
        .collect())
}

#[async_trait]
impl MarketDataApi for CoinGeckoClient {
    async fn list_coins(&self, query: &CoinListQuery) -> Result<Vec<CoinSummary>, MarketError> {
        let url = self.markets_url(query);
        let body = self.fetch_body(&url, "markets").await?;
        let coins = decode_markets(&body)?;

        log::debug!("Fetched {} coins from CoinGecko", coins.len());

        Ok(coins)
    }

    async fn coin_detail(&self, id: &str) -> Result<CoinDetail, MarketError> {
        let url = self.detail_url(id);
        let body = self.fetch_body(&url, id).await?;
        decode_detail(&body)
    }

    async fn market_chart(
        &self,
        id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>, MarketError> {
        let url = self.chart_url(id, vs_currency, days);
        let body = self.fetch_body(&url, id).await?;
        decode_chart(&body)
    }

    fn source_name(&self) -> &'static str {
        "coingecko"
    }
}
