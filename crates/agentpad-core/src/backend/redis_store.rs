use super::StorageBackend;
use crate::config::{BackendKind, RedisConfig};
use crate::error::{Error, Result};
use crate::session::Session;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::IntoConnectionInfo;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Keys fetched per SCAN round trip
const SCAN_BATCH: usize = 200;

/// Redis-backed session storage
///
/// Each session is a single string key `<prefix><session_id>` holding the
/// JSON-encoded record, with a native expiry equal to the session TTL.
/// Updates keep the key's remaining TTL instead of restarting the clock.
///
/// # Security Features
///
/// - Session keys are prefixed to isolate them from other Redis data
/// - Consider enabling Redis AUTH and TLS in production
pub struct RedisBackend {
    client: redis::Client,
    connection: RwLock<Option<MultiplexedConnection>>,
    /// Key prefix for session keys
    prefix: String,
    /// Full session TTL
    ttl: Duration,
}

impl RedisBackend {
    /// Create a backend for a Redis URL or [`redis::ConnectionInfo`]. Call
    /// [`StorageBackend::connect`] before use.
    ///
    /// # Errors
    ///
    /// Returns error if the connection settings are invalid or the TTL is zero.
    pub fn new<T: IntoConnectionInfo>(connection: T, prefix: &str, ttl: Duration) -> Result<Self> {
        if ttl.is_zero() {
            return Err(Error::Configuration(
                "session TTL must be positive".to_string(),
            ));
        }
        let client = redis::Client::open(connection)
            .map_err(|e| Error::Configuration(format!("invalid Redis settings: {}", e)))?;

        Ok(Self {
            client,
            connection: RwLock::new(None),
            prefix: prefix.to_string(),
            ttl,
        })
    }

    /// Create from connection settings
    ///
    /// # Errors
    ///
    /// Returns error if the settings are rejected by the Redis client.
    pub fn from_config(config: &RedisConfig, ttl: Duration) -> Result<Self> {
        info!(endpoint = %config.endpoint(), "Configuring Redis session storage");
        Self::new(config.connection_info()?, &config.key_prefix, ttl)
    }

    /// Build the full Redis key
    fn build_key(&self, session_id: &str) -> String {
        format!("{}{}", self.prefix, session_id)
    }

    fn ttl_millis(&self) -> u64 {
        u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX)
    }

    /// Shared multiplexed connection, or `BackendUnavailable` if disconnected
    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::BackendUnavailable("Redis is not connected".to_string()))
    }

    fn encode(session: &Session) -> Result<String> {
        serde_json::to_string(session)
            .map_err(|e| Error::Serialization(format!("Failed to serialize session: {}", e)))
    }

    /// Every key under this backend's prefix, via incremental SCAN
    async fn scan_keys(&self, conn: &mut MultiplexedConnection) -> Result<Vec<String>> {
        let pattern = format!("{}*", self.prefix);
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }
}

#[async_trait]
impl StorageBackend for RedisBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Redis
    }

    fn has_native_expiry(&self) -> bool {
        true
    }

    async fn create(&self, session: &Session) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let key = self.build_key(&session.id);
        let json = Self::encode(session)?;

        // NX: only set if absent, so a live id is never overwritten
        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(&json)
            .arg("PX")
            .arg(self.ttl_millis())
            .arg("NX")
            .query_async(&mut conn)
            .await?;

        if reply.is_none() {
            return Err(Error::DuplicateId(session.id.clone()));
        }
        debug!(session_id = %session.id, ttl_ms = self.ttl_millis(), "Session saved to Redis");
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        let mut conn = self.get_connection().await?;
        let key = self.build_key(session_id);

        let data: Option<String> = redis::cmd("GET").arg(&key).query_async(&mut conn).await?;

        match data {
            Some(json) => {
                let session: Session = serde_json::from_str(&json).map_err(|e| {
                    Error::Serialization(format!("Failed to deserialize session: {}", e))
                })?;
                debug!(session_id = %session_id, "Session loaded from Redis");
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, session_id: &str, session: &Session) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let key = self.build_key(session_id);
        let json = Self::encode(session)?;

        // PTTL: -2 when the key is gone, -1 when it has no expiry
        let remaining: i64 = redis::cmd("PTTL").arg(&key).query_async(&mut conn).await?;
        let ttl_ms = match u64::try_from(remaining) {
            Ok(ms) if ms > 0 => ms,
            _ => {
                debug!(session_id = %session_id, pttl = remaining, "No remaining TTL, using full TTL");
                self.ttl_millis()
            }
        };

        // XX: only overwrite an existing key; a key that expired in between stays gone
        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(&json)
            .arg("PX")
            .arg(ttl_ms)
            .arg("XX")
            .query_async(&mut conn)
            .await?;

        if reply.is_none() {
            return Err(Error::SessionNotFound(session_id.to_string()));
        }
        debug!(session_id = %session_id, ttl_ms, "Session updated in Redis");
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let key = self.build_key(session_id);

        let deleted: i64 = redis::cmd("DEL").arg(&key).query_async(&mut conn).await?;

        if deleted == 0 {
            return Err(Error::SessionNotFound(session_id.to_string()));
        }
        debug!(session_id = %session_id, "Session deleted from Redis");
        Ok(())
    }

    async fn exists(&self, session_id: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let key = self.build_key(session_id);

        let exists: i64 = redis::cmd("EXISTS").arg(&key).query_async(&mut conn).await?;
        Ok(exists > 0)
    }

    async fn count(&self) -> Result<usize> {
        let mut conn = self.get_connection().await?;
        Ok(self.scan_keys(&mut conn).await?.len())
    }

    async fn sweep_expired(&self) -> Result<usize> {
        // Redis TTL handles expiration automatically
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let keys = self.scan_keys(&mut conn).await?;

        for chunk in keys.chunks(SCAN_BATCH) {
            redis::cmd("DEL")
                .arg(chunk)
                .query_async::<i64>(&mut conn)
                .await?;
        }
        warn!(count = keys.len(), prefix = %self.prefix, "Cleared all sessions from Redis");
        Ok(())
    }

    async fn connect(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;

        *self.connection.write().await = Some(conn);
        info!(prefix = %self.prefix, "Connected to Redis");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if self.connection.write().await.take().is_some() {
            info!("Disconnected from Redis");
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        let Ok(mut conn) = self.get_connection().await else {
            return false;
        };
        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Redis PING failed");
                false
            }
        }
    }
}
