//! In-process session storage.
//!
//! Mirrors the Redis semantics the token store relies on (empty sentinel,
//! per-key TTL, idempotent delete) without a network hop. Used by tests and
//! for local single-replica runs.

use super::SessionBackend;
use crate::error::SessionError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

const DEFAULT_MAX_ENTRIES: usize = 100_000;

/// In-memory TTL key set.
#[derive(Debug)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Instant>>,
    max_entries: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Create an empty backend that sweeps expired keys once it holds more
    /// than `max_entries`.
    #[must_use]
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    /// Remaining TTL of a live key.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .get(key)
            .filter(|expires_at| **expires_at > now)
            .map(|expires_at| *expires_at - now)
    }

    /// Number of stored keys, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no keys are stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Expiry instant for a TTL starting at `now`.
fn deadline(now: Instant, ttl_secs: u64) -> Result<Instant, SessionError> {
    now.checked_add(Duration::from_secs(ttl_secs))
        .ok_or_else(|| SessionError::invalid(format!("ttl of {ttl_secs}s is out of range")))
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn set_ex(&self, key: &str, ttl_secs: u64) -> Result<(), SessionError> {
        let now = Instant::now();
        let expires_at = deadline(now, ttl_secs)?;
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), expires_at);

        if entries.len() > self.max_entries {
            entries.retain(|_, expires_at| *expires_at > now);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, SessionError> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .is_some_and(|expires_at| *expires_at > now))
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool, SessionError> {
        let now = Instant::now();
        let new_expiry = deadline(now, ttl_secs)?;
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(expires_at) if *expires_at > now => {
                *expires_at = new_expiry;
                Ok(true)
            }
            Some(_) => {
                entries.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn del(&self, key: &str) -> Result<(), SessionError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
