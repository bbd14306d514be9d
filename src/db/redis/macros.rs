/// Serves a value from the Redis cache, computing and storing it on a miss.
///
/// A cache read failure is logged and treated as a miss, so an unavailable
/// Redis never fails the request. The computed value is written in the
/// background via `set_in_background`.
///
/// # Arguments
/// * `$cache`: a [`Cache`](crate::db::Cache)
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write
/// * `$ttl`: time-to-live for a stored value, in seconds
/// * `$block`: a future resolving to `AppResult<T>`, awaited on a miss
///
/// # Example
/// ```rust,ignore
/// let response: AppResult<RecommendationResponse> =
///     cached!(cache, key, ttl, async { compute_response() });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache.get_from_cache(&$key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %$key, "Cache hit");
                Ok(cached)
            }
            Ok(None) => {
                tracing::debug!(key = %$key, "Cache miss");
                let value = $block.await?;
                $cache.set_in_background(&$key, &value, $ttl);
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, key = %$key, "Cache read failed, computing directly");
                $block.await
            }
        }
    }};
}
