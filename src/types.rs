//! Types for the crypto tracker core

use crate::constants::{DEFAULT_PAGE, DEFAULT_PER_PAGE, DEFAULT_VS_CURRENCY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One row of the paged market listing
///
/// Immutable snapshot; identity is the remote source's own id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSummary {
    /// Stable coin id, e.g. "bitcoin"
    pub id: String,
    pub symbol: String,
    pub name: String,
    /// Icon URL
    pub image: String,
    /// Current price in the requested quote currency
    pub current_price: f64,
    #[serde(default)]
    pub market_cap: Option<i64>,
    /// 24h percent change, absent for thinly traded coins
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
}

/// Full detail for a single coin
///
/// `market_data` carries currency-keyed maps, so one fetch serves every
/// quote currency the detail screen can switch between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: CoinImage,
    pub market_data: MarketFigures,
}

/// Icon URLs for a coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinImage {
    pub large: String,
}

/// Currency-keyed market figures (currency code -> value)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketFigures {
    pub current_price: HashMap<String, f64>,
    pub market_cap: HashMap<String, f64>,
    pub high_24h: HashMap<String, f64>,
    pub low_24h: HashMap<String, f64>,
}

impl MarketFigures {
    /// Current price in `currency`, if the remote quotes it
    pub fn price_in(&self, currency: &str) -> Option<f64> {
        self.current_price.get(currency).copied()
    }

    /// 24h high in `currency`
    pub fn high_in(&self, currency: &str) -> Option<f64> {
        self.high_24h.get(currency).copied()
    }

    /// 24h low in `currency`
    pub fn low_in(&self, currency: &str) -> Option<f64> {
        self.low_24h.get(currency).copied()
    }

    /// Market cap in `currency`
    pub fn market_cap_in(&self, currency: &str) -> Option<f64> {
        self.market_cap.get(currency).copied()
    }
}

/// One (timestamp, price) sample of a market chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp_ms: i64, price: f64) -> Self {
        Self { timestamp_ms, price }
    }

    /// Sample time as a UTC datetime, None if out of chrono's range
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }
}

/// Sort order for the market listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketOrder {
    MarketCapDesc,
    MarketCapAsc,
    VolumeDesc,
    VolumeAsc,
    IdAsc,
    IdDesc,
}

impl MarketOrder {
    /// Query-parameter value for this order
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketOrder::MarketCapDesc => "market_cap_desc",
            MarketOrder::MarketCapAsc => "market_cap_asc",
            MarketOrder::VolumeDesc => "volume_desc",
            MarketOrder::VolumeAsc => "volume_asc",
            MarketOrder::IdAsc => "id_asc",
            MarketOrder::IdDesc => "id_desc",
        }
    }
}

impl Default for MarketOrder {
    fn default() -> Self {
        MarketOrder::MarketCapDesc
    }
}

/// Parameters for the market listing query
///
/// `per_page` and `page` must be positive; the client forwards them
/// unvalidated, the way it forwards everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinListQuery {
    /// Quote currency, a supported 3-letter code
    pub vs_currency: String,
    pub order: MarketOrder,
    pub per_page: u32,
    pub page: u32,
    /// Include 7d sparkline data in each row
    pub sparkline: bool,
}

impl Default for CoinListQuery {
    fn default() -> Self {
        Self {
            vs_currency: DEFAULT_VS_CURRENCY.to_string(),
            order: MarketOrder::default(),
            per_page: DEFAULT_PER_PAGE,
            page: DEFAULT_PAGE,
            sparkline: false,
        }
    }
}

impl CoinListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vs_currency(mut self, currency: impl Into<String>) -> Self {
        self.vs_currency = currency.into();
        self
    }

    pub fn order(mut self, order: MarketOrder) -> Self {
        self.order = order;
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn sparkline(mut self, sparkline: bool) -> Self {
        self.sparkline = sparkline;
        self
    }
}

/// A locally persisted snapshot of a coin's detail view
///
/// Written when the user favorites a coin, deleted when un-favorited,
/// never otherwise mutated. Column names match the struct fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FavoriteEntry {
    /// Coin id, the table's primary key
    pub id: String,
    pub name: String,
    pub symbol: String,
    /// Icon URL at save time
    pub image: String,
    /// Quote currency the snapshot was taken in
    pub currency: String,
    pub price: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub market_cap: f64,
    /// Comma-joined chart prices at save time
    pub chart_data: String,
    /// Epoch milliseconds at save time
    pub saved_at: i64,
}

impl FavoriteEntry {
    /// Snapshots a detail view for persistence
    ///
    /// Figures missing for `currency` default to 0.0, matching what the
    /// detail screen displays in that case.
    pub fn from_detail(detail: &CoinDetail, currency: &str, chart: &[PricePoint]) -> Self {
        let figures = &detail.market_data;
        Self {
            id: detail.id.clone(),
            name: detail.name.clone(),
            symbol: detail.symbol.clone(),
            image: detail.image.large.clone(),
            currency: currency.to_string(),
            price: figures.price_in(currency).unwrap_or(0.0),
            high_24h: figures.high_in(currency).unwrap_or(0.0),
            low_24h: figures.low_in(currency).unwrap_or(0.0),
            market_cap: figures.market_cap_in(currency).unwrap_or(0.0),
            chart_data: encode_chart_data(chart),
            saved_at: Utc::now().timestamp_millis(),
        }
    }

    /// Parses the stored chart string back into prices
    ///
    /// Malformed segments are skipped rather than failing the whole read.
    pub fn chart_prices(&self) -> Vec<f64> {
        self.chart_data
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect()
    }

    /// Save time as a UTC datetime, None if out of chrono's range
    pub fn saved_at_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.saved_at)
    }
}

/// Serializes chart prices the way the favorites table stores them
pub fn encode_chart_data(points: &[PricePoint]) -> String {
    points
        .iter()
        .map(|p| p.price.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// What the detail screen renders: a coin's detail plus its chart
///
/// Produced by one screen entry; the two fetches behind it are awaited
/// sequentially, detail first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinOverview {
    pub detail: CoinDetail,
    pub chart: Vec<PricePoint>,
}

/// Envelope returned by the headlines query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsPage {
    pub status: String,
    #[serde(rename = "totalResults", default)]
    pub total_results: u32,
    #[serde(default)]
    pub articles: Vec<NewsArticle>,
}

/// A single headline
///
/// Every field is optional; the feed omits them freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "urlToImage")]
    pub url_to_image: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
    pub source: Option<NewsSource>,
}

impl NewsArticle {
    /// Publish time parsed from the feed's RFC 3339 string
    pub fn published_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.published_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Outlet that published an article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsSource {
    pub name: Option<String>,
}

/// Events published by the tracker facade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackerEvent {
    /// A coin snapshot was saved to the favorites table
    FavoriteSaved {
        id: Uuid,
        coin_id: String,
        currency: String,
        price: f64,
        timestamp: DateTime<Utc>,
    },

    /// A coin was removed from the favorites table
    FavoriteRemoved {
        id: Uuid,
        coin_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A screen-entry fetch failed
    RefreshFailed {
        id: Uuid,
        /// What was being fetched ("markets", a coin id, "news")
        resource: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

impl TrackerEvent {
    /// Creates a FavoriteSaved event for a just-persisted entry
    pub fn favorite_saved(entry: &FavoriteEntry) -> Self {
        TrackerEvent::FavoriteSaved {
            id: Uuid::new_v4(),
            coin_id: entry.id.clone(),
            currency: entry.currency.clone(),
            price: entry.price,
            timestamp: Utc::now(),
        }
    }

    /// Creates a FavoriteRemoved event
    pub fn favorite_removed(coin_id: impl Into<String>) -> Self {
        TrackerEvent::FavoriteRemoved {
            id: Uuid::new_v4(),
            coin_id: coin_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a RefreshFailed event
    pub fn refresh_failed(resource: impl Into<String>, error_message: impl Into<String>) -> Self {
        TrackerEvent::RefreshFailed {
            id: Uuid::new_v4(),
            resource: resource.into(),
            error_message: error_message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Get the event ID
    pub fn id(&self) -> Uuid {
        match self {
            TrackerEvent::FavoriteSaved { id, .. } => *id,
            TrackerEvent::FavoriteRemoved { id, .. } => *id,
            TrackerEvent::RefreshFailed { id, .. } => *id,
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            TrackerEvent::FavoriteSaved { .. } => "FAVORITE_SAVED",
            TrackerEvent::FavoriteRemoved { .. } => "FAVORITE_REMOVED",
            TrackerEvent::RefreshFailed { .. } => "REFRESH_FAILED",
        }
    }
}

impl std::fmt::Display for TrackerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerEvent::FavoriteSaved {
                coin_id,
                currency,
                price,
                ..
            } => {
                write!(f, "Favorite saved: {} at {} {}", coin_id, price, currency)
            }
            TrackerEvent::FavoriteRemoved { coin_id, .. } => {
                write!(f, "Favorite removed: {}", coin_id)
            }
            TrackerEvent::RefreshFailed {
                resource,
                error_message,
                ..
            } => {
                write!(f, "Refresh failed for {}: {}", resource, error_message)
            }
        }
    }
}
