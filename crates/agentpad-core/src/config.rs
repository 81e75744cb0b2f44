//! Store configuration
//!
//! Deserialized by the binary from the `[store]` and `[store.redis]` tables of the
//! layered configuration and validated once at startup.

use crate::error::{Error, Result};
use crate::ids::{DEFAULT_SESSION_ID_LENGTH, DEFAULT_TODO_ID_LENGTH};
use redis::{ConnectionAddr, ConnectionInfo, IntoConnectionInfo, RedisConnectionInfo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Shortest sweep interval derived from the TTL
const MIN_CLEANUP_INTERVAL: Duration = Duration::from_secs(1);

/// Longest sweep interval derived from the TTL
const MAX_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Upper bound on `ttl_hours` (ten years)
pub const MAX_TTL_HOURS: u64 = 10 * 365 * 24;

/// Which storage backend to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process map with an active sweep
    #[default]
    Memory,
    /// Redis with native key expiry
    Redis,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Redis => write!(f, "redis"),
        }
    }
}

/// Session store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend selection
    #[serde(default)]
    pub backend: BackendKind,
    /// Session lifetime in hours
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
    /// Length of generated session handles
    #[serde(default = "default_session_id_length")]
    pub session_id_length: usize,
    /// Length of generated todo handles
    #[serde(default = "default_todo_id_length")]
    pub todo_id_length: usize,
    /// Sweep interval for backends without native expiry (derived from TTL if unset)
    #[serde(default)]
    pub cleanup_interval_secs: Option<u64>,
    /// Redis connection settings (used when `backend = "redis"`)
    #[serde(default)]
    pub redis: RedisConfig,
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_session_id_length() -> usize {
    DEFAULT_SESSION_ID_LENGTH
}

fn default_todo_id_length() -> usize {
    DEFAULT_TODO_ID_LENGTH
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            ttl_hours: default_ttl_hours(),
            session_id_length: default_session_id_length(),
            todo_id_length: default_todo_id_length(),
            cleanup_interval_secs: None,
            redis: RedisConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Reject settings that would produce unusable sessions.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` for a zero or oversized TTL, out-of-range handle
    /// lengths, an empty Redis key prefix or a zero cleanup interval.
    pub fn validate(&self) -> Result<()> {
        if self.ttl_hours == 0 {
            return Err(Error::Configuration(
                "store.ttl_hours must be at least 1; a zero TTL would expire sessions on creation"
                    .to_string(),
            ));
        }
        if self.ttl_hours > MAX_TTL_HOURS {
            return Err(Error::Configuration(format!(
                "store.ttl_hours must be at most {}, got {}",
                MAX_TTL_HOURS, self.ttl_hours
            )));
        }
        if !(8..=64).contains(&self.session_id_length) {
            return Err(Error::Configuration(format!(
                "store.session_id_length must be between 8 and 64, got {}",
                self.session_id_length
            )));
        }
        if !(4..=64).contains(&self.todo_id_length) {
            return Err(Error::Configuration(format!(
                "store.todo_id_length must be between 4 and 64, got {}",
                self.todo_id_length
            )));
        }
        if self.cleanup_interval_secs == Some(0) {
            return Err(Error::Configuration(
                "store.cleanup_interval_secs must be positive".to_string(),
            ));
        }
        if self.backend == BackendKind::Redis && self.redis.key_prefix.is_empty() {
            return Err(Error::Configuration(
                "store.redis.key_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Session lifetime
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours.saturating_mul(3600))
    }

    /// Sweep interval: the configured value, or a twelfth of the TTL
    /// clamped to between one second and five minutes
    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        match self.cleanup_interval_secs {
            Some(secs) => Duration::from_secs(secs),
            None => (self.ttl() / 12).clamp(MIN_CLEANUP_INTERVAL, MAX_CLEANUP_INTERVAL),
        }
    }
}

/// Redis connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Server host
    #[serde(default = "default_redis_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_redis_port")]
    pub port: u16,
    /// AUTH password
    #[serde(default)]
    pub password: Option<String>,
    /// Logical database index
    #[serde(default)]
    pub db: i64,
    /// Prefix prepended to every session key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_key_prefix() -> String {
    "agentpad:session:".to_string()
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_redis_host(),
            port: default_redis_port(),
            password: None,
            db: 0,
            key_prefix: default_key_prefix(),
        }
    }
}

impl RedisConfig {
    /// Connection settings for the Redis client.
    ///
    /// Built field by field so passwords containing URL-reserved characters
    /// reach the server unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the client rejects the address.
    pub fn connection_info(&self) -> Result<ConnectionInfo> {
        let mut redis = RedisConnectionInfo::default().set_db(self.db);
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            redis = redis.set_password(password);
        }

        let info = ConnectionAddr::Tcp(self.host.clone(), self.port)
            .into_connection_info()
            .map_err(|e| Error::Configuration(format!("invalid Redis address: {}", e)))?;
        Ok(info.set_redis_settings(redis))
    }

    /// `host:port/db` for log lines; never includes the password
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.db)
    }
}

// Keep the password out of logs
impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("db", &self.db)
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.ttl(), Duration::from_secs(24 * 3600));
        assert_eq!(config.session_id_length, 21);
        assert_eq!(config.todo_id_length, 12);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = StoreConfig {
            ttl_hours: 0,
            ..StoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_id_length_bounds() {
        let short = StoreConfig {
            session_id_length: 4,
            ..StoreConfig::default()
        };
        assert!(short.validate().is_err());

        let long_todo = StoreConfig {
            todo_id_length: 100,
            ..StoreConfig::default()
        };
        assert!(long_todo.validate().is_err());
    }

    #[test]
    fn test_empty_prefix_rejected_for_redis() {
        let mut config = StoreConfig {
            backend: BackendKind::Redis,
            ..StoreConfig::default()
        };
        config.redis.key_prefix.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cleanup_interval_derivation() {
        // 24h / 12 = 2h, clamped to 5 min
        assert_eq!(
            StoreConfig::default().cleanup_interval(),
            Duration::from_secs(300)
        );

        let explicit = StoreConfig {
            cleanup_interval_secs: Some(30),
            ..StoreConfig::default()
        };
        assert_eq!(explicit.cleanup_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_redis_connection_info() {
        let mut redis = RedisConfig::default();
        let info = redis.connection_info().unwrap();
        assert_eq!(
            info.addr(),
            &ConnectionAddr::Tcp("127.0.0.1".to_string(), 6379)
        );
        assert_eq!(info.redis_settings().db(), 0);
        assert!(info.redis_settings().password().is_none());

        redis.password = Some("s3cret".to_string());
        redis.db = 2;
        let info = redis.connection_info().unwrap();
        assert_eq!(info.redis_settings().db(), 2);
        assert_eq!(info.redis_settings().password(), Some("s3cret"));
        assert_eq!(redis.endpoint(), "127.0.0.1:6379/2");
        assert!(!format!("{:?}", redis).contains("s3cret"));
    }

    #[test]
    fn test_redis_password_with_reserved_characters() {
        let redis = RedisConfig {
            password: Some("p@ss/w#rd:?%".to_string()),
            ..RedisConfig::default()
        };
        let info = redis.connection_info().unwrap();
        assert_eq!(info.redis_settings().password(), Some("p@ss/w#rd:?%"));
        assert!(redis::Client::open(info).is_ok());
    }

    #[test]
    fn test_oversized_ttl_rejected() {
        let at_limit = StoreConfig {
            ttl_hours: MAX_TTL_HOURS,
            ..StoreConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        let config = StoreConfig {
            ttl_hours: 10_000_000_000,
            ..StoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_backend_kind_deserialize() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"backend":"redis","ttl_hours":2}"#).unwrap();
        assert_eq!(config.backend, BackendKind::Redis);
        assert_eq!(config.ttl_hours, 2);
        assert_eq!(config.redis.key_prefix, "agentpad:session:");
    }
}
