use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Locale sent with every TMDB request
    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    /// Google Books API key (the volumes endpoint also works without one)
    #[serde(default)]
    pub books_api_key: Option<String>,

    /// Google Books volumes endpoint
    #[serde(default = "default_books_api_url")]
    pub books_api_url: String,

    /// Redis connection URL. When unset, per-user state lives in memory
    /// and provider responses are not cached.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Prefix for persisted per-user keys
    #[serde(default = "default_storage_namespace")]
    pub storage_namespace: String,

    /// TTL in seconds for cached provider responses
    #[serde(default = "default_response_cache_ttl")]
    pub response_cache_ttl: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}

fn default_books_api_url() -> String {
    "https://www.googleapis.com/books/v1/volumes".to_string()
}

fn default_storage_namespace() -> String {
    "cinebook".to_string()
}

fn default_response_cache_ttl() -> u64 {
    3600
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
