#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use redis_sdk::{CacheStore, Config, RedisService, Role, SdkResult};

#[derive(Default)]
struct Keyspace {
    entries: HashMap<String, (String, Option<Instant>)>,
    log: Vec<(Role, &'static str)>,
}

impl Keyspace {
    fn live(&mut self, key: &str) -> Option<&(String, Option<Instant>)> {
        let expired = matches!(
            self.entries.get(key),
            Some((_, Some(deadline))) if *deadline <= Instant::now()
        );
        if expired {
            self.entries.remove(key);
        }
        self.entries.get(key)
    }
}

/// One in-memory node shared by a primary and a replica handle, so writes are
/// visible to reads immediately
#[derive(Clone, Default)]
pub struct MemoryNode {
    keyspace: Arc<Mutex<Keyspace>>,
}

impl MemoryNode {
    pub fn store(&self, role: Role) -> Arc<MemoryStore> {
        Arc::new(MemoryStore {
            role,
            keyspace: self.keyspace.clone(),
        })
    }

    /// Commands served so far, tagged with the role of the handle that served them
    pub fn log(&self) -> Vec<(Role, &'static str)> {
        self.keyspace.lock().unwrap().log.clone()
    }
}

pub struct MemoryStore {
    role: Role,
    keyspace: Arc<Mutex<Keyspace>>,
}

impl MemoryStore {
    fn with<R>(&self, command: &'static str, f: impl FnOnce(&mut Keyspace) -> R) -> R {
        let mut keyspace = self.keyspace.lock().unwrap();
        keyspace.log.push((self.role, command));
        f(&mut keyspace)
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    fn role(&self) -> Role {
        self.role
    }

    async fn ping(&self) -> SdkResult<()> {
        self.with("PING", |_| Ok(()))
    }

    async fn get(&self, key: &str) -> SdkResult<Option<String>> {
        self.with("GET", |ks| Ok(ks.live(key).map(|(value, _)| value.clone())))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> SdkResult<()> {
        let deadline = ttl_seconds.map(|ttl| Instant::now() + Duration::from_secs(ttl));
        self.with("SET", |ks| {
            ks.entries
                .insert(key.to_string(), (value.to_string(), deadline));
            Ok(())
        })
    }

    async fn del(&self, key: &str) -> SdkResult<u64> {
        self.with("DEL", |ks| {
            let existed = ks.live(key).is_some();
            ks.entries.remove(key);
            Ok(u64::from(existed))
        })
    }

    async fn keys(&self, pattern: &str) -> SdkResult<Vec<String>> {
        let prefix = pattern.trim_end_matches('*').to_string();
        self.with("KEYS", |ks| {
            let candidates: Vec<String> = ks
                .entries
                .keys()
                .filter(|key| key.starts_with(&prefix))
                .cloned()
                .collect();
            Ok(candidates
                .into_iter()
                .filter(|key| ks.live(key).is_some())
                .collect())
        })
    }

    async fn mget(&self, keys: &[String]) -> SdkResult<Vec<Option<String>>> {
        self.with("MGET", |ks| {
            Ok(keys
                .iter()
                .map(|key| ks.live(key).map(|(value, _)| value.clone()))
                .collect())
        })
    }

    async fn ttl(&self, key: &str) -> SdkResult<i64> {
        self.with("TTL", |ks| {
            Ok(match ks.live(key) {
                None => -2,
                Some((_, None)) => -1,
                Some((_, Some(deadline))) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    remaining.as_secs_f64().ceil() as i64
                }
            })
        })
    }

    async fn flush_all(&self) -> SdkResult<()> {
        self.with("FLUSHALL", |ks| {
            ks.entries.clear();
            Ok(())
        })
    }

    async fn quit(&self) -> SdkResult<()> {
        self.with("QUIT", |_| Ok(()))
    }
}

/// Service over a fresh in-memory node, plus the node for inspection
pub async fn memory_service() -> (RedisService, MemoryNode) {
    let node = MemoryNode::default();
    let service = RedisService::with_stores(
        Config::default(),
        node.store(Role::Primary),
        node.store(Role::Replica),
    )
    .await
    .unwrap();

    (service, node)
}

/// Waits for background writes queued by `set_in_background` to land
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// Config for the live Redis tests, `REDIS_HOST` / `REDIS_PORT` or localhost
pub fn live_config() -> Config {
    Config {
        host: Some(std::env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string())),
        replica_host: std::env::var("REDIS_REPLICA_HOST").ok(),
        port: std::env::var("REDIS_PORT")
            .ok()
            .and_then(|port| port.parse().ok()),
        password: std::env::var("REDIS_PASSWORD").ok(),
        ..Default::default()
    }
}

/// Key unique to one test run
pub fn unique_key(name: &str) -> String {
    format!("redis-sdk-test:{}:{}", uuid::Uuid::new_v4(), name)
}

/// Minimal RESP server on a random local port
///
/// Replies `+PONG` to PING (after `ping_delay`) and `+OK` to every other command.
/// Returns the port it listens on.
pub async fn spawn_resp_responder(ping_delay: Duration) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(serve_resp(socket, ping_delay));
        }
    });

    port
}

async fn serve_resp(socket: TcpStream, ping_delay: Duration) {
    let (read, mut write) = socket.into_split();
    let mut lines = BufReader::new(read).lines();

    while let Ok(Some(header)) = lines.next_line().await {
        let Some(count) = header
            .strip_prefix('*')
            .and_then(|n| n.parse::<usize>().ok())
        else {
            continue;
        };

        // Each argument is a `$len` line followed by its payload line
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            let _len = lines.next_line().await;
            match lines.next_line().await {
                Ok(Some(arg)) => args.push(arg),
                _ => return,
            }
        }

        let command = args.first().map(|c| c.to_ascii_uppercase());
        let reply = match command.as_deref() {
            Some("PING") => {
                tokio::time::sleep(ping_delay).await;
                "+PONG\r\n"
            }
            _ => "+OK\r\n",
        };

        if write.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }
}

/// Config pointing both roles at a local responder
pub fn responder_config(port: u16) -> Config {
    Config {
        host: Some("127.0.0.1".to_string()),
        port: Some(port),
        ..Default::default()
    }
}
