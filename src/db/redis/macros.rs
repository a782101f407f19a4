/// Read-through caching for provider calls.
///
/// `$cache` is an `Option<Cache>`. With no cache the block simply runs.
/// Otherwise a hit is returned directly and a miss runs the block and queues
/// the result for a background write. Cache read failures are logged and
/// treated as misses so an unavailable Redis never fails a request.
///
/// # Arguments
/// * `$cache`: `Option<Cache>` used for retrieval and storage.
/// * `$key`: the `CacheKey` for the value.
/// * `$ttl`: time-to-live for the cached value in seconds.
/// * `$block`: future computing the value on a miss.
///
/// # Example
/// ```rust,ignore
/// cached!(self.cache, CacheKey::MovieDetails(id.to_string()), self.cache_ttl, async move {
///     fetch_details(id).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match &$cache {
            Some(cache) => {
                let key = $key;
                let hit = match cache.get_from_cache(&key).await {
                    Ok(hit) => hit,
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Cache read failed, fetching from provider");
                        None
                    }
                };
                match hit {
                    Some(cached) => {
                        tracing::debug!(key = %key, "Cache hit");
                        Ok(cached)
                    }
                    None => {
                        let value = $block.await?;
                        cache.set_in_background(&key, &value, $ttl);
                        Ok(value)
                    }
                }
            }
            None => $block.await,
        }
    }};
}
