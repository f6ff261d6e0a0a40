use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};

use super::store::{CacheStore, Role};
use crate::config::Config;
use crate::error::{SdkError, SdkResult};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6379;

/// Builds the connection parameters for one role
///
/// Port, password and TLS are shared; only the host differs. The replica falls back to
/// the primary host when no replica host is configured. An empty password means no AUTH.
pub fn connection_info(config: &Config, role: Role) -> ConnectionInfo {
    let host = match role {
        Role::Primary => config.host.as_deref(),
        Role::Replica => config.replica_host.as_deref().or(config.host.as_deref()),
    }
    .unwrap_or(DEFAULT_HOST)
    .to_string();
    let port = config.port.unwrap_or(DEFAULT_PORT);

    let addr = if config.is_tls_enabled() {
        ConnectionAddr::TcpTls {
            host,
            port,
            insecure: false,
            tls_params: None,
        }
    } else {
        ConnectionAddr::Tcp(host, port)
    };

    ConnectionInfo {
        addr,
        redis: RedisConnectionInfo {
            password: config.password.clone().filter(|p| !p.is_empty()),
            ..Default::default()
        },
    }
}

/// A multiplexed, auto-reconnecting connection to one Redis node
#[derive(Clone)]
pub struct RedisConnection {
    role: Role,
    conn: ConnectionManager,
}

impl RedisConnection {
    /// Opens a connection for `role`
    ///
    /// Failing to reach the node is reported as a connectivity error for that role.
    pub async fn open(config: &Config, role: Role) -> SdkResult<Self> {
        let info = connection_info(config, role);
        tracing::debug!(role = %role, addr = ?info.addr, "Opening Redis connection");

        let client = Client::open(info).map_err(|e| SdkError::connectivity(role, e))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| SdkError::connectivity(role, e))?;

        Ok(Self { role, conn })
    }

    /// Get raw connection for commands this SDK does not wrap
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisConnection {
    fn role(&self) -> Role {
        self.role
    }

    async fn ping(&self) -> SdkResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> SdkResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> SdkResult<()> {
        let mut conn = self.conn.clone();
        match ttl_seconds {
            Some(ttl) => {
                let _: () = conn.set_ex(key, value, ttl).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }
        Ok(())
    }

    async fn del(&self, key: &str) -> SdkResult<u64> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(key).await?;
        Ok(removed)
    }

    async fn keys(&self, pattern: &str) -> SdkResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }

    async fn mget(&self, keys: &[String]) -> SdkResult<Vec<Option<String>>> {
        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> =
            redis::cmd("MGET").arg(keys).query_async(&mut conn).await?;
        Ok(values)
    }

    async fn ttl(&self, key: &str) -> SdkResult<i64> {
        let mut conn = self.conn.clone();
        let ttl: i64 = conn.ttl(key).await?;
        Ok(ttl)
    }

    async fn flush_all(&self) -> SdkResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("FLUSHALL").query_async(&mut conn).await?;
        Ok(())
    }

    async fn quit(&self) -> SdkResult<()> {
        let mut conn = self.conn.clone();
        let reply: redis::RedisResult<()> = redis::cmd("QUIT").query_async(&mut conn).await;
        match reply {
            Ok(()) => Ok(()),
            // The server may hang up before the reply is read
            Err(e) if e.is_connection_dropped() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
