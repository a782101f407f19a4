pub mod cache;
pub mod storage;

mod macros;

pub use cache::create_redis_client;
pub use cache::Cache;
pub use cache::CacheKey;
pub use cache::CacheWriterHandle;
pub use storage::RedisStore;
