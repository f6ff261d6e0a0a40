/// Read-through caching for an inline `async` block.
///
/// Looks the key up through the service. A present value is returned as-is. Otherwise
/// the block is awaited, its `Ok` value is queued for a background write with the given
/// TTL, and returned. Errors from the lookup or the block are propagated with `?`, so
/// the enclosing function must return a `Result` whose error type converts from
/// [`SdkError`](crate::SdkError).
///
/// # Arguments
/// * `$service`: a [`RedisService`](crate::RedisService) or a reference to one.
/// * `$key`: the cache key, anything that derefs to `str`.
/// * `$ttl`: TTL in seconds as `Option<u64>`, `None` for no expiration.
/// * `$block`: the future computing the value on a miss.
///
/// # Example
/// ```rust,no_run
/// # use redis_sdk::{cached, RedisService, SdkResult};
/// async fn balance(service: &RedisService, account: &str) -> SdkResult<u64> {
///     let key = format!("balance:{}", account);
///     cached!(service, key, Some(30), async move { Ok::<u64, redis_sdk::SdkError>(1_000) })
/// }
/// ```
#[macro_export]
macro_rules! cached {
    ($service:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $service.get(&$key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $service.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
