//! Application facade over market data, news, favorites and preferences
//!
//! One [`CryptoTracker`] owns the clients and stores the app's screens
//! read from, and publishes [`TrackerEvent`]s worth surfacing in a UI.

use crate::{
    client::MarketDataApi,
    coingecko::CoinGeckoClient,
    constants::{
        COINGECKO_API_URL, DEFAULT_NEWS_CATEGORY, DEFAULT_NEWS_LANGUAGE, DEFAULT_VS_CURRENCY,
        EVENT_CHANNEL_CAPACITY, FAVORITES_DB_FILE, NEWS_API_URL, PREFS_FILE,
    },
    error::{MarketError, StorageError, TrackerError},
    favorites::FavoritesStore,
    news::{NewsApi, NewsApiClient},
    prefs::PrefsStore,
    types::{
        CoinDetail, CoinListQuery, CoinOverview, CoinSummary, FavoriteEntry, NewsPage, PricePoint,
        TrackerEvent,
    },
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, watch};

/// Default directory for the tracker's local state
///
/// The platform data directory when one exists, otherwise a dot
/// directory relative to the working directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("crypto-tracker"))
        .unwrap_or_else(|| PathBuf::from(".crypto-tracker"))
}

/// Configuration for [`CryptoTracker::new`]
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Base URL of the market data API
    pub market_api_url: String,
    /// Base URL of the headline feed
    pub news_api_url: String,
    /// Key sent with every headline request
    pub news_api_key: String,
    /// Location of the favorites database
    pub db_path: PathBuf,
    /// Location of the preferences file
    pub prefs_path: PathBuf,
    /// Currency used when a caller does not name one
    pub default_currency: String,
}

impl TrackerConfig {
    /// Creates a config with the public endpoints and state under `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            market_api_url: COINGECKO_API_URL.to_string(),
            news_api_url: NEWS_API_URL.to_string(),
            news_api_key: String::new(),
            db_path: data_dir.join(FAVORITES_DB_FILE),
            prefs_path: data_dir.join(PREFS_FILE),
            default_currency: DEFAULT_VS_CURRENCY.to_string(),
        }
    }

    /// Creates a config from the environment
    ///
    /// Reads the headline key from `NEWS_API_KEY`; when unset the key is
    /// left empty and the feed will reject requests.
    pub fn from_env() -> Self {
        let key = std::env::var("NEWS_API_KEY").unwrap_or_default();
        Self::new(default_data_dir()).news_api_key(key)
    }

    pub fn news_api_key(mut self, key: impl Into<String>) -> Self {
        self.news_api_key = key.into();
        self
    }

    pub fn default_currency(mut self, currency: impl Into<String>) -> Self {
        self.default_currency = currency.into();
        self
    }
}

/// Crypto market tracker
///
/// Wires the market data client, the headline feed and the local stores
/// together behind one handle the rest of the application talks to.
///
/// # Example
/// ```no_run
/// use crypto_tracker_sdk::{CryptoTracker, TrackerConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TrackerConfig::new("/var/lib/crypto-tracker").news_api_key("my-key");
/// let tracker = CryptoTracker::new(config).await?;
///
/// let coins = tracker.top_coins(&tracker.default_query()).await?;
/// println!("tracking {} coins", coins.len());
/// # Ok(())
/// # }
/// ```
pub struct CryptoTracker {
    market: Arc<dyn MarketDataApi>,
    news: Arc<dyn NewsApi>,
    favorites: Arc<FavoritesStore>,
    prefs: PrefsStore,
    default_currency: String,
    event_tx: broadcast::Sender<TrackerEvent>,
}

impl CryptoTracker {
    /// Creates a tracker backed by the live APIs and on-disk state
    pub async fn new(config: TrackerConfig) -> Result<Self, TrackerError> {
        let market = CoinGeckoClient::with_base_url(config.market_api_url)?;
        let news = NewsApiClient::with_base_url(config.news_api_url, config.news_api_key)?;
        let favorites = FavoritesStore::open(&config.db_path).await?;
        let prefs = PrefsStore::new(config.prefs_path);

        Ok(Self::with_components(
            Arc::new(market),
            Arc::new(news),
            Arc::new(favorites),
            prefs,
            config.default_currency,
        ))
    }

    /// Creates a tracker from preassembled components
    ///
    /// This is primarily for testing with mock clients.
    pub fn with_components(
        market: Arc<dyn MarketDataApi>,
        news: Arc<dyn NewsApi>,
        favorites: Arc<FavoritesStore>,
        prefs: PrefsStore,
        default_currency: impl Into<String>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            market,
            news,
            favorites,
            prefs,
            default_currency: default_currency.into(),
            event_tx,
        }
    }

    /// Currency used when a caller does not name one
    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    /// A market listing query in the configured default currency
    pub fn default_query(&self) -> CoinListQuery {
        CoinListQuery::new().vs_currency(self.default_currency.as_str())
    }

    /// The preferences store holding local account state
    pub fn prefs(&self) -> &PrefsStore {
        &self.prefs
    }

    /// Subscribes to tracker events
    ///
    /// A slow reader misses events once the channel buffer wraps.
    pub fn subscribe_events(&self) -> broadcast::Receiver<TrackerEvent> {
        self.event_tx.subscribe()
    }

    fn publish(&self, event: TrackerEvent) {
        // Send fails only when no subscriber is listening
        let _ = self.event_tx.send(event);
    }

    /// Passes a fetch result through, publishing a refresh-failed event
    /// for the resource when it is an error
    fn observed<T>(
        &self,
        resource: &str,
        result: Result<T, MarketError>,
    ) -> Result<T, MarketError> {
        if let Err(e) = &result {
            tracing::warn!(resource, error = %e, "Refresh failed");
            self.publish(TrackerEvent::refresh_failed(resource, e.to_string()));
        }
        result
    }

    /// Fetches the ranked coin listing for the market screen
    pub async fn top_coins(&self, query: &CoinListQuery) -> Result<Vec<CoinSummary>, MarketError> {
        let start = Instant::now();
        let result = self.market.list_coins(query).await;

        if let Ok(coins) = &result {
            tracing::debug!(
                count = coins.len(),
                source = self.market.source_name(),
                latency_ms = start.elapsed().as_millis() as u64,
                "Fetched coin listing"
            );
        }

        self.observed("markets", result)
    }

    /// Fetches everything the detail screen shows for one coin
    ///
    /// The detail is fetched first and the chart after it completes;
    /// a detail failure means the chart is never requested.
    pub async fn coin_overview(
        &self,
        id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<CoinOverview, MarketError> {
        let detail = self.observed(id, self.market.coin_detail(id).await)?;
        let chart = self.observed(id, self.market.market_chart(id, vs_currency, days).await)?;

        Ok(CoinOverview { detail, chart })
    }

    /// Fetches the headlines shown on the news screen
    pub async fn latest_news(&self) -> Result<NewsPage, MarketError> {
        let result = self
            .news
            .top_headlines(DEFAULT_NEWS_CATEGORY, DEFAULT_NEWS_LANGUAGE)
            .await;
        self.observed("news", result)
    }

    /// Whether the coin is currently saved as a favorite
    pub async fn is_favorite(&self, id: &str) -> Result<bool, StorageError> {
        self.favorites.exists(id).await
    }

    /// Every saved favorite, in storage order
    pub async fn favorites(&self) -> Result<Vec<FavoriteEntry>, StorageError> {
        self.favorites.all().await
    }

    /// Subscribes to favorites snapshots
    ///
    /// The receiver starts out holding the current set and is updated
    /// after every change.
    pub fn watch_favorites(&self) -> watch::Receiver<Vec<FavoriteEntry>> {
        self.favorites.subscribe()
    }

    /// Saves the coin as a favorite, or removes it when already saved
    ///
    /// The entry snapshots the detail figures in `vs_currency` along with
    /// the chart prices. Returns whether the coin ended up saved.
    pub async fn toggle_favorite(
        &self,
        detail: &CoinDetail,
        vs_currency: &str,
        chart: &[PricePoint],
    ) -> Result<bool, StorageError> {
        if self.favorites.exists(&detail.id).await? {
            self.favorites.remove(&detail.id).await?;
            tracing::info!(coin_id = %detail.id, "Removed favorite");
            self.publish(TrackerEvent::favorite_removed(&detail.id));
            Ok(false)
        } else {
            let entry = FavoriteEntry::from_detail(detail, vs_currency, chart);
            self.favorites.upsert(&entry).await?;
            tracing::info!(coin_id = %detail.id, vs_currency, "Saved favorite");
            self.publish(TrackerEvent::favorite_saved(&entry));
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockMarketApi;
    use crate::news::mock::MockNewsApi;
    use crate::types::{CoinImage, MarketFigures, NewsArticle};
    use std::collections::HashMap;
    use tokio::sync::broadcast::error::TryRecvError;

    async fn test_tracker() -> (
        CryptoTracker,
        Arc<MockMarketApi>,
        Arc<MockNewsApi>,
        tempfile::TempDir,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let market = Arc::new(MockMarketApi::new());
        let news = Arc::new(MockNewsApi::new());
        let favorites = Arc::new(FavoritesStore::in_memory().await.unwrap());
        let prefs = PrefsStore::new(dir.path().join("prefs.json"));

        let tracker =
            CryptoTracker::with_components(market.clone(), news.clone(), favorites, prefs, "usd");
        (tracker, market, news, dir)
    }

    fn sample_detail() -> CoinDetail {
        CoinDetail {
            id: "bitcoin".to_string(),
            symbol: "btc".to_string(),
            name: "Bitcoin".to_string(),
            image: CoinImage {
                large: "https://example.com/btc.png".to_string(),
            },
            market_data: MarketFigures {
                current_price: HashMap::from([("usd".to_string(), 68500.50)]),
                market_cap: HashMap::from([("usd".to_string(), 1_350_000_000_000.0)]),
                high_24h: HashMap::from([("usd".to_string(), 69100.0)]),
                low_24h: HashMap::from([("usd".to_string(), 67800.0)]),
            },
        }
    }

    fn sample_summary() -> CoinSummary {
        CoinSummary {
            id: "bitcoin".to_string(),
            symbol: "btc".to_string(),
            name: "Bitcoin".to_string(),
            image: "https://example.com/btc.png".to_string(),
            current_price: 68500.50,
            market_cap: Some(1_350_000_000_000),
            price_change_percentage_24h: Some(2.4),
        }
    }

    #[test]
    fn config_places_state_under_the_data_dir() {
        let config = TrackerConfig::new("/var/lib/tracker").news_api_key("k");

        assert_eq!(
            config.db_path,
            PathBuf::from("/var/lib/tracker/favorites.db")
        );
        assert_eq!(
            config.prefs_path,
            PathBuf::from("/var/lib/tracker/prefs.json")
        );
        assert_eq!(config.market_api_url, COINGECKO_API_URL);
        assert_eq!(config.news_api_key, "k");
        assert_eq!(config.default_currency, "usd");
    }

    #[tokio::test]
    async fn new_assembles_a_tracker_with_fresh_local_state() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrackerConfig::new(dir.path()).news_api_key("k");

        let tracker = CryptoTracker::new(config).await.unwrap();

        assert!(tracker.favorites().await.unwrap().is_empty());
        assert!(!tracker.prefs().is_logged_in().unwrap());
        assert_eq!(tracker.default_currency(), "usd");
    }

    #[tokio::test]
    async fn top_coins_delegates_and_stays_quiet_on_success() {
        let (tracker, market, _news, _dir) = test_tracker().await;
        market.set_coins(vec![sample_summary()]);
        let mut events = tracker.subscribe_events();

        let coins = tracker.top_coins(&CoinListQuery::new()).await.unwrap();

        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].id, "bitcoin");
        assert_eq!(market.calls(), vec!["list_coins:usd:50:1"]);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn top_coins_failure_publishes_a_refresh_event() {
        let (tracker, market, _news, _dir) = test_tracker().await;
        market.set_coins_error(MarketError::RateLimited);
        let mut events = tracker.subscribe_events();

        let result = tracker.top_coins(&CoinListQuery::new()).await;

        assert!(matches!(result, Err(MarketError::RateLimited)));
        match events.try_recv().unwrap() {
            TrackerEvent::RefreshFailed { resource, .. } => assert_eq!(resource, "markets"),
            other => panic!("unexpected event: {other}"),
        }
    }

    #[tokio::test]
    async fn coin_overview_fetches_detail_then_chart() {
        let (tracker, market, _news, _dir) = test_tracker().await;
        let chart = vec![PricePoint::new(0, 3950.0), PricePoint::new(1, 3980.0)];
        market.set_detail(sample_detail());
        market.set_chart("bitcoin", chart.clone());

        let overview = tracker.coin_overview("bitcoin", "usd", 7).await.unwrap();

        assert_eq!(overview.detail.id, "bitcoin");
        assert_eq!(overview.chart, chart);
        assert_eq!(
            market.calls(),
            vec!["coin_detail:bitcoin", "market_chart:bitcoin:usd:7"]
        );
    }

    #[tokio::test]
    async fn coin_overview_detail_failure_skips_the_chart() {
        let (tracker, market, _news, _dir) = test_tracker().await;
        market.set_detail_error("bitcoin", MarketError::RateLimited);
        market.set_chart("bitcoin", vec![PricePoint::new(0, 1.0)]);
        let mut events = tracker.subscribe_events();

        let result = tracker.coin_overview("bitcoin", "usd", 7).await;

        assert!(result.is_err());
        assert_eq!(market.calls(), vec!["coin_detail:bitcoin"]);
        match events.try_recv().unwrap() {
            TrackerEvent::RefreshFailed { resource, .. } => assert_eq!(resource, "bitcoin"),
            other => panic!("unexpected event: {other}"),
        }
    }

    #[tokio::test]
    async fn latest_news_requests_the_default_feed() {
        let (tracker, _market, news, _dir) = test_tracker().await;
        news.set_page(NewsPage {
            status: "ok".to_string(),
            total_results: 1,
            articles: vec![NewsArticle {
                title: Some("Markets rally".to_string()),
                description: None,
                url: None,
                url_to_image: None,
                published_at: None,
                source: None,
            }],
        });

        let page = tracker.latest_news().await.unwrap();

        assert_eq!(page.articles.len(), 1);
        assert_eq!(
            news.calls(),
            vec![("business".to_string(), "en".to_string())]
        );
    }

    #[tokio::test]
    async fn toggle_favorite_saves_then_removes() {
        let (tracker, _market, _news, _dir) = test_tracker().await;
        let detail = sample_detail();
        let chart = [PricePoint::new(0, 68000.0)];
        let mut events = tracker.subscribe_events();

        assert!(tracker
            .toggle_favorite(&detail, "usd", &chart)
            .await
            .unwrap());
        assert!(tracker.is_favorite("bitcoin").await.unwrap());
        assert_eq!(tracker.favorites().await.unwrap().len(), 1);
        match events.try_recv().unwrap() {
            TrackerEvent::FavoriteSaved { coin_id, price, .. } => {
                assert_eq!(coin_id, "bitcoin");
                assert_eq!(price, 68500.50);
            }
            other => panic!("unexpected event: {other}"),
        }

        assert!(!tracker
            .toggle_favorite(&detail, "usd", &chart)
            .await
            .unwrap());
        assert!(!tracker.is_favorite("bitcoin").await.unwrap());
        assert!(tracker.favorites().await.unwrap().is_empty());
        match events.try_recv().unwrap() {
            TrackerEvent::FavoriteRemoved { coin_id, .. } => assert_eq!(coin_id, "bitcoin"),
            other => panic!("unexpected event: {other}"),
        }
    }

    #[tokio::test]
    async fn watch_favorites_sees_saves() {
        let (tracker, _market, _news, _dir) = test_tracker().await;
        let mut rx = tracker.watch_favorites();
        assert!(rx.borrow_and_update().is_empty());

        tracker
            .toggle_favorite(&sample_detail(), "usd", &[])
            .await
            .unwrap();

        rx.changed().await.unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "bitcoin");
    }

    #[tokio::test]
    async fn default_query_uses_the_configured_currency() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = CryptoTracker::with_components(
            Arc::new(MockMarketApi::new()),
            Arc::new(MockNewsApi::new()),
            Arc::new(FavoritesStore::in_memory().await.unwrap()),
            PrefsStore::new(dir.path().join("prefs.json")),
            "eur",
        );

        assert_eq!(tracker.default_currency(), "eur");
        assert_eq!(tracker.default_query().vs_currency, "eur");
    }
}
