use std::fmt::Display;

use crate::error::SdkResult;

/// Which node a connection talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Write-capable node
    Primary,
    /// Read-only replica, may lag the primary
    Replica,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Primary => write!(f, "primary"),
            Role::Replica => write!(f, "replica"),
        }
    }
}

/// Raw key-value commands against a single Redis node
///
/// Values cross this boundary as JSON text; encoding and decoding happen in
/// [`RedisService`](super::RedisService). [`RedisConnection`](super::RedisConnection)
/// is the production implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Role this store was opened for, used in logs and errors
    fn role(&self) -> Role;

    /// PING
    async fn ping(&self) -> SdkResult<()>;

    /// GET, `None` when the key is absent
    async fn get(&self, key: &str) -> SdkResult<Option<String>>;

    /// SET, or SETEX when `ttl_seconds` is given
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> SdkResult<()>;

    /// DEL, returns the number of keys removed
    async fn del(&self, key: &str) -> SdkResult<u64>;

    /// KEYS with a glob pattern
    async fn keys(&self, pattern: &str) -> SdkResult<Vec<String>>;

    /// MGET, one entry per key in input order
    async fn mget(&self, keys: &[String]) -> SdkResult<Vec<Option<String>>>;

    /// TTL in seconds, `-2` when absent and `-1` when the key never expires
    async fn ttl(&self, key: &str) -> SdkResult<i64>;

    /// FLUSHALL
    async fn flush_all(&self) -> SdkResult<()>;

    /// QUIT
    async fn quit(&self) -> SdkResult<()>;
}
