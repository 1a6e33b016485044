//! Session storage.
//!
//! [`SessionBackend`] is the seam to the shared key-value store: four
//! single-key primitives, each one network round trip. [`TokenStore`]
//! builds the register/validate/destroy semantics on top of it.

pub mod memory;
pub mod redis;
pub mod token_store;

use crate::error::SessionError;
use async_trait::async_trait;

pub use self::redis::RedisBackend;
pub use memory::MemoryBackend;
pub use token_store::{TokenStore, Validation};

/// Key-value primitives required by the token store.
///
/// Implementations store an empty sentinel value; only key existence and TTL
/// carry meaning.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Create or overwrite `key` with a TTL of `ttl_secs` seconds.
    async fn set_ex(&self, key: &str, ttl_secs: u64) -> Result<(), SessionError>;

    /// Whether `key` exists and has not expired.
    async fn exists(&self, key: &str) -> Result<bool, SessionError>;

    /// Reset the TTL of `key` to `ttl_secs` from now.
    ///
    /// Returns `false` if the key no longer exists.
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool, SessionError>;

    /// Delete `key`. Absent keys are not an error.
    async fn del(&self, key: &str) -> Result<(), SessionError>;

    /// Short backend name for logs and metrics.
    fn name(&self) -> &'static str;
}
