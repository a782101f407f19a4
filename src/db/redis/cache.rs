use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppResult;

/// Cached provider responses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    MovieSearch(String),
    MoviesByGenre(String),
    MovieDetails(String),
    MovieRecommendations(String),
    BookSearch(String),
    BooksByCategory(String),
    BookDetails(String),
    BookRecommendations(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::MovieSearch(query) => write!(f, "movies:search:{}", query.to_lowercase()),
            CacheKey::MoviesByGenre(genres) => write!(f, "movies:genre:{}", genres),
            CacheKey::MovieDetails(id) => write!(f, "movies:details:{}", id),
            CacheKey::MovieRecommendations(id) => write!(f, "movies:recs:{}", id),
            CacheKey::BookSearch(query) => write!(f, "books:search:{}", query.to_lowercase()),
            CacheKey::BooksByCategory(category) => {
                write!(f, "books:category:{}", category.to_lowercase())
            }
            CacheKey::BookDetails(id) => write!(f, "books:details:{}", id),
            CacheKey::BookRecommendations(query) => {
                write!(f, "books:recs:{}", query.to_lowercase())
            }
        }
    }
}

/// Creates a Redis client
///
/// The client connects lazily; no network traffic happens here.
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

/// Read-through cache for provider responses stored in Redis
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
    /// Initiates a graceful shutdown of the cache writer
    ///
    /// Sends a shutdown signal to the writer task, which flushes all pending
    /// writes to Redis before exiting.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates a new Cache instance with an async write background task
    ///
    /// Cache writes are queued to the background task so they never delay
    /// the response that produced them.
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

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

    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Cache writer shutting down, flushing remaining writes");

                    // Senders live inside every Cache clone, so drain only
                    // what is already queued instead of waiting for close.
                    while let Ok(msg) = write_rx.try_recv() {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::error!(
                                error = %e,
                                "Failed to flush cache write during shutdown"
                            );
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

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` when the key is absent. A stored value that no longer
    /// deserializes into `T` is also reported as a miss.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(format!("{}", key)).await?;

        match cached {
            Some(json) => match serde_json::from_str(&json) {
                Ok(data) => Ok(Some(data)),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Stores a value in the cache asynchronously without blocking
    ///
    /// The value is serialized here and handed to the background writer.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

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
