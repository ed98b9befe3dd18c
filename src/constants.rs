//! Constants for the crypto tracker core
//!
//! Endpoints, transport settings and default query values are centralized
//! here. Per-installation values (news API key, database path) come from
//! `TrackerConfig` instead.

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko endpoint for the paged market listing
pub const COINGECKO_MARKETS_ENDPOINT: &str = "/coins/markets";

/// CoinGecko endpoint prefix for per-coin lookups (`/coins/{id}`)
pub const COINGECKO_COINS_ENDPOINT: &str = "/coins";

/// News API base URL
pub const NEWS_API_URL: &str = "https://newsapi.org/v2";

/// News API endpoint for headline queries
pub const NEWS_HEADLINES_ENDPOINT: &str = "/top-headlines";

/// HTTP request timeout when fetching market data or news (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// How long a cached response body stays fresh (in seconds)
///
/// Mirrors the `Cache-Control: max-age=30` override the app applies to
/// market-data responses. Expired entries are simply refetched; there is
/// no other invalidation.
pub const RESPONSE_CACHE_TTL_SECS: u64 = 30;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "crypto-tracker-sdk/0.1.0";

/// Default quote currency for list and chart queries
pub const DEFAULT_VS_CURRENCY: &str = "usd";

/// Default page size for the market listing
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Default page number for the market listing
pub const DEFAULT_PAGE: u32 = 1;

/// Default news category
pub const DEFAULT_NEWS_CATEGORY: &str = "business";

/// Default news language
pub const DEFAULT_NEWS_LANGUAGE: &str = "en";

/// File name of the favorites database inside the data directory
pub const FAVORITES_DB_FILE: &str = "favorites.db";

/// File name of the preferences file inside the data directory
pub const PREFS_FILE: &str = "prefs.json";

/// Buffered events per tracker event subscriber
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Lookback windows (in days) the detail screen offers for charts
///
/// The chart endpoint itself accepts any value; out-of-range behavior is
/// server-defined and not validated client-side.
pub const SUPPORTED_CHART_DAYS: &[u32] = &[1, 7, 30, 365];

/// Quote currencies the detail screen offers
pub const SUPPORTED_CURRENCIES: &[&str] = &[
    "usd", "inr", "gbp", "eur", "jpy", "aud", "cad", "chf", "cny", "sgd",
    "hkd", "sek", "nok", "rub", "zar", "nzd", "thb", "krw", "mxn", "brl",
];

/// Display symbol for a supported currency code, empty when unknown
pub fn currency_symbol(code: &str) -> &'static str {
    match code.to_ascii_lowercase().as_str() {
        "usd" => "$",
        "inr" => "₹",
        "gbp" => "£",
        "eur" => "€",
        "jpy" => "¥",
        "aud" => "A$",
        "cad" => "C$",
        "chf" => "CHF ",
        "cny" => "¥",
        "sgd" => "S$",
        "hkd" => "HK$",
        "sek" => "kr ",
        "nok" => "kr ",
        "rub" => "₽",
        "zar" => "R ",
        "nzd" => "NZ$",
        "thb" => "฿",
        "krw" => "₩",
        "mxn" => "Mex$",
        "brl" => "R$",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_symbol_known_codes() {
        assert_eq!(currency_symbol("usd"), "$");
        assert_eq!(currency_symbol("USD"), "$");
        assert_eq!(currency_symbol("eur"), "€");
    }

    #[test]
    fn currency_symbol_unknown_is_empty() {
        assert_eq!(currency_symbol("xyz"), "");
    }

    #[test]
    fn every_supported_currency_has_a_symbol() {
        for code in SUPPORTED_CURRENCIES {
            assert!(!currency_symbol(code).is_empty(), "missing symbol for {code}");
        }
    }
}
