//! Durable favorites store with live snapshot broadcasts
//!
//! One SQLite table keyed by coin id, plus a tokio watch channel so
//! multiple consumers can subscribe to the committed favorite set and
//! receive a fresh snapshot after every mutation.

use crate::{error::StorageError, types::FavoriteEntry};
use futures::Stream;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tokio::sync::{watch, Mutex};

/// Favorites table: one row per favorited coin, snapshot taken at save time
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS favorite_coins (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    symbol TEXT NOT NULL,
    image TEXT NOT NULL,
    currency TEXT NOT NULL,
    price REAL NOT NULL,
    high_24h REAL NOT NULL,
    low_24h REAL NOT NULL,
    market_cap REAL NOT NULL,
    chart_data TEXT NOT NULL,
    saved_at INTEGER NOT NULL
);
"#;

/// Durable store for the favorite set
///
/// The sole reader and writer of the favorites table. Mutations are
/// atomic per row; after each one the store re-reads the committed set
/// and publishes it to every subscriber, so observers only ever see
/// committed states. Mutations are serialized through a store-level
/// lock on top of SQLite's own transaction guarantees, which keeps the
/// published snapshots in commit order.
pub struct FavoritesStore {
    pool: SqlitePool,
    /// Serializes mutation, re-query and publish as one unit
    write_lock: Mutex<()>,
    snapshot_tx: watch::Sender<Vec<FavoriteEntry>>,
}

impl FavoritesStore {
    /// Opens (creating if missing) a file-backed store
    ///
    /// # Arguments
    /// * `path` - Location of the database file; parent directory is
    ///   created when absent
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        Self::from_pool(pool).await
    }

    /// Opens an in-memory store, primarily for tests
    pub async fn in_memory() -> Result<Self, StorageError> {
        // Every connection gets its own :memory: database, so the pool
        // is pinned to a single connection that must never be reclaimed:
        // reaping it would discard the schema and every stored row
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    /// Creates the schema and seeds the snapshot channel
    async fn from_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        sqlx::query(SCHEMA).execute(&pool).await?;

        let seed = Self::query_all(&pool).await?;
        let (snapshot_tx, _) = watch::channel(seed);

        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
            snapshot_tx,
        })
    }

    /// Inserts or replaces the entry for its coin id
    ///
    /// Idempotent; a second save of the same coin overwrites the row.
    pub async fn upsert(&self, entry: &FavoriteEntry) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        sqlx::query(
            "INSERT OR REPLACE INTO favorite_coins \
             (id, name, symbol, image, currency, price, high_24h, low_24h, market_cap, chart_data, saved_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.name)
        .bind(&entry.symbol)
        .bind(&entry.image)
        .bind(&entry.currency)
        .bind(entry.price)
        .bind(entry.high_24h)
        .bind(entry.low_24h)
        .bind(entry.market_cap)
        .bind(&entry.chart_data)
        .bind(entry.saved_at)
        .execute(&self.pool)
        .await?;

        log::debug!("Saved favorite {} at {} {}", entry.id, entry.price, entry.currency);

        self.publish_snapshot().await
    }

    /// Deletes the row for a coin id
    ///
    /// An absent row is a no-op, not an error.
    pub async fn remove(&self, id: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let result = sqlx::query("DELETE FROM favorite_coins WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            log::debug!("Favorite {} was not present", id);
        } else {
            log::debug!("Removed favorite {}", id);
        }

        self.publish_snapshot().await
    }

    /// Checks whether a coin id is favorited
    pub async fn exists(&self, id: &str) -> Result<bool, StorageError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM favorite_coins WHERE id = ?)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(found)
    }

    /// Reads the entry for a coin id, if favorited
    pub async fn get(&self, id: &str) -> Result<Option<FavoriteEntry>, StorageError> {
        let row = sqlx::query_as::<_, FavoriteEntry>(
            "SELECT * FROM favorite_coins WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Reads the committed favorite set in storage order
    pub async fn all(&self) -> Result<Vec<FavoriteEntry>, StorageError> {
        Self::query_all(&self.pool).await
    }

    /// Subscribes to committed snapshots of the favorite set
    ///
    /// The receiver starts out holding the current committed set and is
    /// notified after every upsert/remove. Rapid mutations may coalesce;
    /// the latest committed snapshot is always delivered. Dropping the
    /// receiver releases the subscription.
    pub fn subscribe(&self) -> watch::Receiver<Vec<FavoriteEntry>> {
        self.snapshot_tx.subscribe()
    }

    /// Stream adapter over [`subscribe`](Self::subscribe)
    ///
    /// Yields the current committed set first, then a fresh snapshot
    /// after each mutation. Ends when the store is dropped.
    pub fn stream(&self) -> impl Stream<Item = Vec<FavoriteEntry>> + Send {
        let rx = self.snapshot_tx.subscribe();
        futures::stream::unfold((rx, true), |(mut rx, first)| async move {
            if first {
                let snapshot = rx.borrow_and_update().clone();
                return Some((snapshot, (rx, false)));
            }
            match rx.changed().await {
                Ok(()) => {
                    let snapshot = rx.borrow_and_update().clone();
                    Some((snapshot, (rx, false)))
                }
                Err(_) => None,
            }
        })
    }

    /// Re-reads the committed set and publishes it to subscribers
    ///
    /// Callers must hold the write lock.
    async fn publish_snapshot(&self) -> Result<(), StorageError> {
        let rows = Self::query_all(&self.pool).await?;
        self.snapshot_tx.send_replace(rows);
        Ok(())
    }

    async fn query_all(pool: &SqlitePool) -> Result<Vec<FavoriteEntry>, StorageError> {
        let rows = sqlx::query_as::<_, FavoriteEntry>("SELECT * FROM favorite_coins")
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }
}
