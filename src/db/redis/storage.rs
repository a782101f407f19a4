use redis::AsyncCommands;
use redis::Client;

use crate::db::storage::{KeyValueStore, StorageKey};
use crate::error::AppResult;

/// Redis-backed per-user storage.
///
/// Keys are written without a TTL and prefixed with the configured namespace,
/// e.g. `cinebook:recentlyViewedMovies`.
#[derive(Clone)]
pub struct RedisStore {
    redis_client: Client,
    namespace: String,
}

impl RedisStore {
    pub fn new(redis_client: Client, namespace: impl Into<String>) -> Self {
        Self {
            redis_client,
            namespace: namespace.into(),
        }
    }

    fn namespaced(&self, key: StorageKey) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

#[async_trait::async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: StorageKey) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(self.namespaced(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: StorageKey, value: String) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(self.namespaced(key), value).await?;
        tracing::debug!(key = %key, namespace = %self.namespace, "Persisted value");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
