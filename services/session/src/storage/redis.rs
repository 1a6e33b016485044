//! Redis-backed session storage.

use super::SessionBackend;
use crate::config::RedisConfig;
use crate::error::SessionError;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::time::timeout;
use tracing::info;

/// Shared Redis store reached through a multiplexed connection manager.
///
/// The manager is cloned per command; clones share one connection and
/// reconnect transparently after transport errors.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// Connect and ping the store, failing fast if it is unreachable.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` when the URL is invalid, the dial timeout
    /// elapses or the store does not answer `PING`.
    pub async fn connect(config: &RedisConfig) -> Result<Self, SessionError> {
        let url = config
            .connection_url()
            .map_err(|e| SessionError::unavailable(e.to_string()))?;
        let client = redis::Client::open(url.as_str())?;

        let mut conn = timeout(config.dial_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                SessionError::unavailable(format!(
                    "connect timed out after {:?}",
                    config.dial_timeout
                ))
            })??;

        let pong: String = timeout(config.dial_timeout, redis::cmd("PING").query_async(&mut conn))
            .await
            .map_err(|_| SessionError::unavailable("ping timed out"))??;

        info!(
            host = %config.host,
            port = config.port,
            database = config.database,
            reply = %pong,
            "Connected to Redis"
        );

        Ok(Self { conn })
    }
}

#[async_trait]
impl SessionBackend for RedisBackend {
    async fn set_ex(&self, key: &str, ttl_secs: u64) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, "", ttl_secs).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, SessionError> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool, SessionError> {
        let mut conn = self.conn.clone();
        let seconds = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        Ok(conn.expire(key, seconds).await?)
    }

    async fn del(&self, key: &str) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
