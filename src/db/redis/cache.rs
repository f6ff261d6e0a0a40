use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{mpsc, OnceCell};
use tokio::task::JoinHandle;

use super::connection::RedisConnection;
use super::store::{CacheStore, Role};
use crate::config::Config;
use crate::error::{SdkError, SdkResult};
use crate::models::CachedItem;

static INSTANCE: OnceCell<RedisService> = OnceCell::const_new();

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl_seconds: Option<u64>,
}

/// Handle for gracefully shutting down the cache writer
struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task and waits until every queued write has been flushed
    async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");

        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task failed");
        }
    }
}

/// Cache access over a primary (writer) and a replica (reader) connection
///
/// Reads go to the replica and everything else goes to the primary. Values are
/// stored as JSON text.
pub struct RedisService {
    writer: Arc<dyn CacheStore>,
    reader: Arc<dyn CacheStore>,
    config: Config,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
    writer_handle: Mutex<Option<CacheWriterHandle>>,
    disconnected: AtomicBool,
}

impl RedisService {
    /// Returns the process-wide service, creating it on first call
    ///
    /// The first call must supply a configuration, otherwise it fails with
    /// [`SdkError::NotInitialized`]. Callers arriving while that first setup is running
    /// wait for it. Once the service exists, the argument is ignored.
    pub async fn get_instance(config: Option<&Config>) -> SdkResult<&'static RedisService> {
        INSTANCE
            .get_or_try_init(|| async move {
                let config = config.ok_or(SdkError::NotInitialized)?.clone();
                Self::connect(config).await
            })
            .await
    }

    /// Connects a caller-owned service to the primary and replica nodes in `config`
    pub async fn connect(config: Config) -> SdkResult<Self> {
        let (writer, reader) = tokio::try_join!(
            RedisConnection::open(&config, Role::Primary),
            RedisConnection::open(&config, Role::Replica),
        )?;

        Self::with_stores(config, Arc::new(writer), Arc::new(reader)).await
    }

    /// Builds a service over existing stores
    ///
    /// Both stores are pinged before the service is returned. This spawns the background
    /// writer, so it must run inside a tokio runtime.
    pub async fn with_stores(
        config: Config,
        writer: Arc<dyn CacheStore>,
        reader: Arc<dyn CacheStore>,
    ) -> SdkResult<Self> {
        Self::verify_connections(writer.as_ref(), reader.as_ref()).await?;

        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let store = writer.clone();
        let task = tokio::spawn(async move {
            Self::cache_writer_task(store, write_rx, shutdown_rx).await;
        });

        Ok(Self {
            writer,
            reader,
            config,
            write_tx,
            writer_handle: Mutex::new(Some(CacheWriterHandle { shutdown_tx, task })),
            disconnected: AtomicBool::new(false),
        })
    }

    async fn verify_connections(
        writer: &dyn CacheStore,
        reader: &dyn CacheStore,
    ) -> SdkResult<()> {
        tokio::try_join!(Self::ping(writer), Self::ping(reader))?;
        tracing::info!("Start Redis servers successful");
        Ok(())
    }

    async fn ping(store: &dyn CacheStore) -> SdkResult<()> {
        let role = store.role();
        store.ping().await.map_err(|e| {
            tracing::error!(role = %role, error = %e, "Redis ping failed");
            SdkError::connectivity(role, e)
        })
    }

    /// Background task that processes cache write messages
    ///
    /// On shutdown the channel is closed and every message already queued is written
    /// before the task exits.
    async fn cache_writer_task(
        store: Arc<dyn CacheStore>,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::debug!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    Self::write_message(store.as_ref(), msg).await;
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    while let Some(msg) = write_rx.recv().await {
                        Self::write_message(store.as_ref(), msg).await;
                    }

                    tracing::debug!("Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_message(store: &dyn CacheStore, msg: CacheWriteMessage) {
        if let Err(e) = store.set(&msg.key, &msg.value, msg.ttl_seconds).await {
            tracing::error!(error = %e, key = %msg.key, "Failed to write to Redis cache");
        }
    }

    fn ensure_connected(&self) -> SdkResult<()> {
        if self.disconnected.load(Ordering::Acquire) {
            return Err(SdkError::Disconnected);
        }
        Ok(())
    }

    /// Configuration this service was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Store bound to the primary node
    pub fn writer(&self) -> Arc<dyn CacheStore> {
        self.writer.clone()
    }

    /// Store bound to the replica node
    pub fn reader(&self) -> Arc<dyn CacheStore> {
        self.reader.clone()
    }

    /// Stores `value` as JSON under `key`
    ///
    /// With a non-zero `ttl_seconds` the key expires after that many seconds; otherwise
    /// it never expires.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: Option<u64>,
    ) -> SdkResult<()> {
        self.ensure_connected()?;
        let json = serde_json::to_string(value)?;
        tracing::debug!(key = %key, ttl = ?ttl_seconds, "Cache set");
        self.writer
            .set(key, &json, ttl_seconds.filter(|ttl| *ttl > 0))
            .await
    }

    /// Reads `key` from the replica, `None` when absent
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> SdkResult<Option<T>> {
        self.ensure_connected()?;
        match self.reader.get(key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Deletes `key`, returning the number of keys removed (0 or 1)
    pub async fn delete(&self, key: &str) -> SdkResult<u64> {
        self.ensure_connected()?;
        let removed = self.writer.del(key).await?;
        tracing::debug!(key = %key, removed, "Cache delete");
        Ok(removed)
    }

    /// Deletes every key starting with `prefix`
    ///
    /// Keys are listed with `KEYS prefix*` and deleted one by one, so the operation is
    /// not atomic: a key written after the scan survives, and the first failed delete
    /// stops the loop. Returns the matched keys, empty when nothing matched.
    ///
    /// `prefix` is not escaped, so glob characters in it (`*`, `?`, `[`) keep their
    /// `KEYS` meaning: `user[12]` matches `user1...` and `user2...`, not `user[12]...`.
    pub async fn delete_by_prefix(&self, prefix: &str) -> SdkResult<Vec<String>> {
        self.ensure_connected()?;
        let keys = self.writer.keys(&format!("{}*", prefix)).await?;

        for key in &keys {
            self.delete(key).await?;
        }

        tracing::debug!(prefix = %prefix, deleted = keys.len(), "Cache delete by prefix");
        Ok(keys)
    }

    /// Reads several keys from the replica in one round-trip
    ///
    /// The result has one entry per input key, in input order, `None` where absent.
    pub async fn get_many<T: DeserializeOwned>(
        &self,
        keys: &[String],
    ) -> SdkResult<Vec<Option<T>>> {
        self.ensure_connected()?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        self.reader
            .mget(keys)
            .await?
            .into_iter()
            .map(|value| -> SdkResult<Option<T>> {
                match value {
                    Some(json) => Ok(Some(serde_json::from_str(&json)?)),
                    None => Ok(None),
                }
            })
            .collect()
    }

    /// Remaining lifetime of `key` in seconds, read from the replica
    ///
    /// Follows the Redis convention: `-2` when the key is absent, `-1` when it has no
    /// expiration.
    pub async fn get_ttl(&self, key: &str) -> SdkResult<i64> {
        self.ensure_connected()?;
        self.reader.ttl(key).await
    }

    /// Removes every key in every database of the primary
    pub async fn flush_all(&self) -> SdkResult<()> {
        self.ensure_connected()?;
        tracing::warn!("Flushing all keys from Redis");
        self.writer.flush_all().await
    }

    /// Queues a write without waiting for it
    ///
    /// Serialization and write failures are logged, never returned.
    pub fn set_in_background<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: Option<u64>,
    ) {
        if self.disconnected.load(Ordering::Acquire) {
            tracing::warn!(key = %key, "Dropping cache write after disconnect");
            return;
        }

        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl_seconds: ttl_seconds.filter(|ttl| *ttl > 0),
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }

    /// Read-through lookup
    ///
    /// Looks up the key produced by `key_fn`. A present value is returned as a cache hit
    /// and `compute_fn` is not called. On a miss `compute_fn` runs; a `Some` result is
    /// written back in the background and returned without waiting for the write.
    ///
    /// Concurrent misses on the same key each compute and each write; the last write wins.
    pub async fn get_or_compute<T, K, F, Fut, E>(
        &self,
        key_fn: K,
        compute_fn: F,
        ttl_seconds: Option<u64>,
    ) -> Result<CachedItem<Option<T>>, E>
    where
        T: Serialize + DeserializeOwned,
        K: FnOnce() -> String,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: From<SdkError>,
    {
        let cache_key = key_fn();

        if let Some(cached) = self.get::<T>(&cache_key).await? {
            tracing::debug!(key = %cache_key, "Cache hit");
            return Ok(CachedItem::hit(Some(cached)));
        }

        tracing::debug!(key = %cache_key, "Cache miss");
        let fresh = compute_fn().await?;

        if let Some(value) = &fresh {
            self.set_in_background(&cache_key, value, ttl_seconds);
        }

        Ok(CachedItem::miss(fresh))
    }

    /// Flushes pending background writes and closes both connections
    ///
    /// Calling this again is a no-op. Must not run while other operations are in flight.
    pub async fn disconnect(&self) -> SdkResult<()> {
        if self.disconnected.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let handle = self
            .writer_handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }

        let writer = self.writer.quit().await;
        let reader = self.reader.quit().await;
        tracing::info!("Disconnected from Redis");

        writer.and(reader)
    }
}
