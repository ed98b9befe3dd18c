//! Error types for the crypto tracker core

use thiserror::Error;

/// Errors that can occur when talking to the market-data or news APIs
#[derive(Debug, Error)]
pub enum MarketError {
    /// Network request failed
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Decode error: {reason}")]
    Decode { reason: String },

    /// Remote resource does not exist (HTTP 404)
    #[error("Not found: {id}")]
    NotFound { id: String },

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Remote API reported an error
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },
}

impl MarketError {
    /// Creates a Decode error
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode { reason: reason.into() }
    }

    /// Creates a NotFound error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates an Api error
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api { status, body: body.into() }
    }
}

/// Errors that can occur in the local persistence layer
///
/// Covers both the favorites table and the preferences file. Operations
/// that fail here are surfaced to the caller unchanged; nothing in this
/// crate retries or partially commits.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File read/write failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized
    #[error("Format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Errors that can occur while assembling the tracker
///
/// Construction touches both halves of the crate: HTTP clients for the
/// remote feeds and the stores for local state.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Building an HTTP client failed
    #[error("Market error: {0}")]
    Market(#[from] MarketError),

    /// Opening local storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
