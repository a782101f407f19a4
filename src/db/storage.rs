/// Per-user key-value storage
///
/// Holds the recently-viewed lists and the language preference between runs.
/// Values are opaque strings; the recommendation store decides how to encode
/// them.
use std::{collections::HashMap, fmt::Display};

use tokio::sync::RwLock;

use crate::error::AppResult;

/// Keys owned by the recommendation store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    RecentlyViewedMovies,
    RecentlyViewedBooks,
    PreferredLanguage,
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKey::RecentlyViewedMovies => write!(f, "recentlyViewedMovies"),
            StorageKey::RecentlyViewedBooks => write!(f, "recentlyViewedBooks"),
            StorageKey::PreferredLanguage => write!(f, "preferredLanguage"),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the raw value stored under `key`
    async fn get(&self, key: StorageKey) -> AppResult<Option<String>>;

    /// Replaces the value stored under `key`
    async fn set(&self, key: StorageKey, value: String) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Process-local storage used when no Redis instance is configured
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<StorageKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`
    pub fn with_entries(entries: impl IntoIterator<Item = (StorageKey, String)>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: StorageKey) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(&key).cloned())
    }

    async fn set(&self, key: StorageKey, value: String) -> AppResult<()> {
        self.entries.write().await.insert(key, value);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
