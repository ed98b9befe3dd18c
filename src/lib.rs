//! # Crypto Tracker SDK
//!
//! The non-UI core of a crypto price tracker: a typed client for a
//! CoinGecko-style market data API, a headline feed client, and small
//! local stores for favorite coins and account preferences.
//!
//! ## Usage
//!
//! One [`CryptoTracker`] handle wires the pieces together:
//!
//! ```no_run
//! use crypto_tracker_sdk::{CryptoTracker, TrackerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TrackerConfig::from_env();
//! let tracker = CryptoTracker::new(config).await?;
//!
//! // Market listing for the main screen
//! for coin in tracker.top_coins(&tracker.default_query()).await? {
//!     println!("{}: ${:.2}", coin.symbol, coin.current_price);
//! }
//!
//! // Detail plus a 7-day chart for one coin
//! let overview = tracker.coin_overview("bitcoin", "usd", 7).await?;
//! let saved = tracker
//!     .toggle_favorite(&overview.detail, "usd", &overview.chart)
//!     .await?;
//! println!("bitcoin favorited: {saved}");
//! # Ok(())
//! # }
//! ```
//!
//! Remote failures surface as [`MarketError`], local persistence
//! failures as [`StorageError`]; [`CryptoTracker::new`] can hit either
//! side and returns [`TrackerError`], which wraps both. The clients sit
//! behind the [`MarketDataApi`] and [`NewsApi`] traits, so tests and
//! alternate backends can swap them out.

pub mod client;
pub mod coingecko;
pub mod constants;
pub mod error;
pub mod favorites;
pub mod news;
pub mod prefs;
pub mod tracker;
pub mod types;

// Re-export commonly used types
pub use client::MarketDataApi;
pub use coingecko::CoinGeckoClient;
pub use error::{MarketError, StorageError, TrackerError};
pub use favorites::FavoritesStore;
pub use news::{NewsApi, NewsApiClient};
pub use prefs::{Preferences, PrefsStore};
pub use tracker::{default_data_dir, CryptoTracker, TrackerConfig};
pub use types::{
    CoinDetail, CoinListQuery, CoinOverview, CoinSummary, FavoriteEntry, MarketOrder, NewsArticle,
    NewsPage, PricePoint, TrackerEvent,
};
