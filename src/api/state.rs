use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::{
    config::Config,
    db::{
        create_redis_client, redis::CacheWriterHandle, Cache, KeyValueStore, MemoryStore,
        RedisStore,
    },
    services::{
        providers::{BookProvider, GoogleBooksProvider, MovieProvider, TmdbProvider},
        RecommendationStore,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecommendationStore>,
    pub movies: Arc<dyn MovieProvider>,
    pub books: Arc<dyn BookProvider>,
}

impl AppState {
    /// Restores the recommendation store on top of the given providers and storage
    pub async fn new(
        movies: Arc<dyn MovieProvider>,
        books: Arc<dyn BookProvider>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let store = RecommendationStore::load(movies.clone(), books.clone(), storage).await;

        Self {
            store: Arc::new(store),
            movies,
            books,
        }
    }

    /// Wires providers, storage and the response cache from configuration.
    ///
    /// Without a Redis URL, per-user state is kept in memory and provider
    /// responses are not cached. The returned handle, when present, flushes
    /// pending cache writes on shutdown.
    pub async fn from_config(config: &Config) -> anyhow::Result<(Self, Option<CacheWriterHandle>)> {
        let (cache, cache_handle, storage): (
            Option<Cache>,
            Option<CacheWriterHandle>,
            Arc<dyn KeyValueStore>,
        ) = match &config.redis_url {
            Some(redis_url) => {
                let client = create_redis_client(redis_url)?;
                let (cache, handle) = Cache::new(client.clone()).await;
                let storage = RedisStore::new(client, config.storage_namespace.clone());
                tracing::info!(namespace = %config.storage_namespace, "Using Redis storage");
                (Some(cache), Some(handle), Arc::new(storage) as Arc<dyn KeyValueStore>)
            }
            None => {
                tracing::warn!("REDIS_URL not set, per-user state will not survive restarts");
                (None, None, Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>)
            }
        };

        let movies: Arc<dyn MovieProvider> = Arc::new(TmdbProvider::new(
            cache.clone(),
            config.response_cache_ttl,
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_language.clone(),
        ));
        let books: Arc<dyn BookProvider> = Arc::new(GoogleBooksProvider::new(
            cache,
            config.response_cache_ttl,
            config.books_api_key.clone(),
            config.books_api_url.clone(),
        ));

        tracing::info!(
            movie_provider = movies.name(),
            book_provider = books.name(),
            "Metadata providers configured"
        );

        let state = Self::new(movies, books, storage).await;
        Ok((state, cache_handle))
    }

    /// Starts the first recommendation load in the background.
    ///
    /// Failures are logged. Popular routes fetch on demand until a load
    /// succeeds, and `is_loading` reports the load while it runs.
    pub fn spawn_initial_load(&self) -> JoinHandle<()> {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.load_recommendations().await {
                tracing::warn!(error = %e, "Initial recommendation load failed");
            }
        })
    }
}
