//! News headlines client
//!
//! Independent read-only collaborator of the market-data client; same
//! failure semantics, no response cache.

use crate::{
    constants::{NEWS_API_URL, NEWS_HEADLINES_ENDPOINT, REQUEST_TIMEOUT_SECS, USER_AGENT},
    error::MarketError,
    types::NewsPage,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Trait for headline feeds
#[async_trait]
pub trait NewsApi: Send + Sync {
    /// Fetches the current headlines for a category and language
    async fn top_headlines(
        &self,
        category: &str,
        language: &str,
    ) -> Result<NewsPage, MarketError>;

    /// Returns the name of this feed
    fn source_name(&self) -> &'static str;
}

/// NewsAPI-style headlines client
pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    /// Creates a client against the public news endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self, MarketError> {
        Self::with_base_url(NEWS_API_URL, api_key)
    }

    /// Creates a client against a non-default endpoint, e.g. a local test server
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, MarketError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(MarketError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Builds the headlines URL; the key rides along as a query parameter
    fn headlines_url(&self, category: &str, language: &str) -> String {
        format!(
            "{}{}?category={}&language={}&apiKey={}",
            self.base_url, NEWS_HEADLINES_ENDPOINT, category, language, self.api_key
        )
    }
}

fn decode_page(body: &str) -> Result<NewsPage, MarketError> {
    serde_json::from_str(body).map_err(|e| {
        MarketError::decode(format!(
            "Failed to parse headlines: {}. Response: {}",
            e, body
        ))
    })
}

#[async_trait]
impl NewsApi for NewsApiClient {
    async fn top_headlines(
        &self,
        category: &str,
        language: &str,
    ) -> Result<NewsPage, MarketError> {
        let url = self.headlines_url(category, language);

        // The key is part of the URL, so log the query instead
        log::debug!(
            "Fetching top headlines: category={}, language={}",
            category,
            language
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(MarketError::Network)?;

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

        let status = response.status().as_u16();
        let body = response.text().await.map_err(MarketError::Network)?;
        let page = decode_page(&body)?;

        // The feed reports some failures inside a 200 envelope
        if page.status != "ok" {
            return Err(MarketError::api(status, body));
        }

        log::debug!(
            "Fetched {} of {} headlines",
            page.articles.len(),
            page.total_results
        );

        Ok(page)
    }

    fn source_name(&self) -> &'static str {
        "newsapi"
    }
}
