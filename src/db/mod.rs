pub mod redis;
pub mod storage;

pub use self::redis::create_redis_client;
pub use self::redis::Cache;
pub use self::redis::CacheKey;
pub use self::redis::RedisStore;
pub use self::storage::{KeyValueStore, MemoryStore, StorageKey};
