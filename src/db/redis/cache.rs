use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;
use crate::services::indexer::normalize_tag;
use crate::services::ranker::{RankingParams, RankingPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A finished recommendation response for one catalog snapshot
    Recommendations { catalog: String, query: String },
}

impl CacheKey {
    /// Builds the key for a recommendation request against a catalog fingerprint
    ///
    /// Genres are normalized and sorted because projection ignores their order.
    /// The ranking policy is part of the key so processes with different
    /// boost or window settings never share entries.
    pub fn recommendations<S: AsRef<str>>(
        fingerprint: &str,
        preferred_genres: &[S],
        params: &RankingParams,
        policy: &RankingPolicy,
    ) -> Self {
        let mut genres: Vec<String> = preferred_genres
            .iter()
            .filter_map(|g| normalize_tag(g.as_ref()))
            .collect();
        genres.sort();

        CacheKey::Recommendations {
            catalog: fingerprint.to_string(),
            query: format!(
                "{}:{}:{}:{}:{}:{}:{}",
                policy.oversample_factor,
                policy.popularity_threshold,
                policy.popularity_boost,
                params.n,
                params.min_rating,
                params.min_votes,
                genres.join("|")
            ),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Recommendations { catalog, query } => write!(f, "recs:{}:{}", catalog, query),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Cache handler for storing and retrieving responses from Redis
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task to flush pending writes and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates a new Cache and spawns its background writer task
    ///
    /// Writes go through a channel so storing a response never delays the
    /// request that produced it.
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        // Spawn background task to process cache writes
        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            write_tx,
        };

        let handle = CacheWriterHandle { shutdown_tx };

        (cache, handle)
    }

    /// Drains write messages into Redis until shutdown, then flushes the rest
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");
        let mut failed_writes = 0usize;

        loop {
            tokio::select! {
                // Process write messages
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        failed_writes += 1;
                        tracing::error!(error = %e, failed_writes, "Failed to write to Redis cache");
                    }
                }
                // Shutdown signal received
                _ = shutdown_rx.recv() => {
                    tracing::info!("Cache writer shutting down, flushing remaining writes");

                    // Stop accepting new writes, then flush what is already queued
                    write_rx.close();
                    while let Some(msg) = write_rx.recv().await {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        }
                    }

                    tracing::info!("Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Retrieves and deserializes a cached value, `None` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(format!("{}", key)).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Queues a value for writing without waiting for Redis
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        // Hand off to the writer task; the caller never waits on Redis
        let msg = CacheWriteMessage {
            key: format!("{}", key),
            value: json,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FINGERPRINT: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    fn default_key<S: AsRef<str>>(genres: &[S]) -> CacheKey {
        CacheKey::recommendations(
            FINGERPRINT,
            genres,
            &RankingParams::default(),
            &RankingPolicy::default(),
        )
    }

    #[test]
    fn test_cache_key_display_recommendations() {
        let key = default_key(&["Action", "Sci-Fi"]);
        assert_eq!(
            format!("{}", key),
            format!("recs:{}:5:50:1.05:10:6:100:action|sci-fi", FINGERPRINT)
        );
    }

    #[test]
    fn test_cache_key_keeps_full_fingerprint() {
        let CacheKey::Recommendations { catalog, .. } = default_key(&["Drama"]);
        assert_eq!(catalog, FINGERPRINT);
    }

    #[test]
    fn test_cache_key_ignores_genre_order_and_case() {
        assert_eq!(default_key(&["Drama", "Action"]), default_key(&["action", " DRAMA"]));
    }

    #[test]
    fn test_cache_key_separates_parameters_and_catalogs() {
        let policy = RankingPolicy::default();
        let base = default_key(&["Drama"]);

        let stricter = RankingParams::new(10, 7.5, 100).unwrap();
        assert_ne!(
            base,
            CacheKey::recommendations(FINGERPRINT, &["Drama"], &stricter, &policy)
        );

        let other_catalog = CacheKey::recommendations(
            "0000000000000000ffff",
            &["Drama"],
            &RankingParams::default(),
            &policy,
        );
        assert_ne!(base, other_catalog);
    }

    #[test]
    fn test_cache_key_separates_ranking_policies() {
        let params = RankingParams::default();
        let base = default_key(&["Action"]);

        let stronger_boost = RankingPolicy {
            popularity_boost: 2.0,
            ..RankingPolicy::default()
        };
        let narrower_window = RankingPolicy {
            oversample_factor: 1,
            ..RankingPolicy::default()
        };
        let higher_threshold = RankingPolicy {
            popularity_threshold: 80.0,
            ..RankingPolicy::default()
        };

        for policy in [stronger_boost, narrower_window, higher_threshold] {
            assert_ne!(
                base,
                CacheKey::recommendations(FINGERPRINT, &["Action"], &params, &policy)
            );
        }
    }

    #[test]
    fn test_cache_key_empty_query() {
        let key = default_key::<&str>(&[]);
        assert_eq!(
            format!("{}", key),
            format!("recs:{}:5:50:1.05:10:6:100:", FINGERPRINT)
        );
    }

    #[tokio::test]
    #[ignore = "requires a running Redis at REDIS_URL"]
    async fn test_set_in_background_writes_to_cache() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = create_redis_client(&redis_url).unwrap();
        let (cache, handle) = Cache::new(client.clone()).await;

        let key = default_key(&["test_async_write"]);
        let value = vec!["item1".to_string(), "item2".to_string()];

        // Write, then flush through a graceful shutdown
        cache.set_in_background(&key, &value, 60);
        handle.shutdown().await;
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        // Clean up
        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(format!("{}", key)).await.unwrap();
    }
}
