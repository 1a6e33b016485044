//! Token liveness store with sliding expiration.
//!
//! A token is live iff its key exists in the backend. Validation checks
//! existence and then resets the TTL in a second, separate call; concurrent
//! validations of one token race on the reset and the last write wins.

use super::SessionBackend;
use crate::error::SessionError;
use crate::metrics::{REFRESH_FAILURES, STORE_OPERATIONS};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Token is live and its TTL was reset
    Refreshed,
    /// Token was live at check time but the TTL reset did not take
    RefreshFailed {
        /// Why the reset failed
        reason: String,
    },
}

impl Validation {
    /// Whether the TTL reset took effect.
    #[must_use]
    pub const fn is_refreshed(&self) -> bool {
        matches!(self, Self::Refreshed)
    }
}

/// Register/validate/destroy semantics over a [`SessionBackend`].
///
/// Every backend call is bounded by `deadline`; an elapsed deadline is a
/// `StoreUnavailable` failure.
pub struct TokenStore {
    backend: Arc<dyn SessionBackend>,
    deadline: Duration,
}

impl TokenStore {
    /// Create a store over `backend` with a per-call deadline.
    #[must_use]
    pub fn new(backend: Arc<dyn SessionBackend>, deadline: Duration) -> Self {
        Self { backend, deadline }
    }

    /// Record `token` as live for `ttl`, overwriting any previous entry.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the backend fails or times out.
    pub async fn register(&self, token: &str, ttl: Duration) -> Result<(), SessionError> {
        self.bounded("register", self.backend.set_ex(token, ttl.as_secs()))
            .await
    }

    /// Confirm `token` is live and slide its expiration to `ttl` from now.
    ///
    /// A failed TTL reset does not fail the call; it is reported as
    /// [`Validation::RefreshFailed`].
    ///
    /// # Errors
    ///
    /// `NotFound` if the token is absent or expired, `StoreUnavailable` if
    /// existence could not be checked.
    pub async fn validate(&self, token: &str, ttl: Duration) -> Result<Validation, SessionError> {
        if !self.bounded("exists", self.backend.exists(token)).await? {
            return Err(SessionError::NotFound);
        }

        let reason = match self
            .bounded("expire", self.backend.expire(token, ttl.as_secs()))
            .await
        {
            Ok(true) => return Ok(Validation::Refreshed),
            // Expired between the two calls.
            Ok(false) => "key vanished before expire".to_string(),
            Err(err) => err.to_string(),
        };

        let failure = SessionError::RefreshFailure {
            reason: reason.clone(),
        };
        REFRESH_FAILURES.inc();
        warn!(
            backend = self.backend.name(),
            error_code = failure.code(),
            error = %failure,
            "Token live but TTL reset failed"
        );
        Ok(Validation::RefreshFailed { reason })
    }

    /// Forget `token`. Succeeds whether or not it existed.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the backend fails or times out.
    pub async fn destroy(&self, token: &str) -> Result<(), SessionError> {
        self.bounded("destroy", self.backend.del(token)).await
    }

    /// Name of the underlying backend.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, SessionError>>,
    ) -> Result<T, SessionError> {
        let result = match timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::unavailable(format!(
                "{operation} timed out after {:?}",
                self.deadline
            ))),
        };

        let status = if result.is_ok() { "ok" } else { "error" };
        STORE_OPERATIONS
            .with_label_values(&[operation, status])
            .inc();
        if let Err(err) = &result {
            debug!(operation, backend = self.backend.name(), error = %err, "Store call failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store_over(backend: Arc<dyn SessionBackend>) -> TokenStore {
        TokenStore::new(backend, Duration::from_secs(1))
    }

    /// Backend whose `expire` always fails, counting every call.
    #[derive(Default)]
    struct BrokenExpire {
        inner: MemoryBackend,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SessionBackend for BrokenExpire {
        async fn set_ex(&self, key: &str, ttl_secs: u64) -> Result<(), SessionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.set_ex(key, ttl_secs).await
        }
        async fn exists(&self, key: &str) -> Result<bool, SessionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.exists(key).await
        }
        async fn expire(&self, _key: &str, _ttl_secs: u64) -> Result<bool, SessionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SessionError::unavailable("READONLY replica"))
        }
        async fn del(&self, key: &str) -> Result<(), SessionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.del(key).await
        }
        fn name(&self) -> &'static str {
            "broken-expire"
        }
    }

    /// Backend that never answers.
    struct Hanging;

    #[async_trait]
    impl SessionBackend for Hanging {
        async fn set_ex(&self, _key: &str, _ttl_secs: u64) -> Result<(), SessionError> {
            std::future::pending().await
        }
        async fn exists(&self, _key: &str) -> Result<bool, SessionError> {
            std::future::pending().await
        }
        async fn expire(&self, _key: &str, _ttl_secs: u64) -> Result<bool, SessionError> {
            std::future::pending().await
        }
        async fn del(&self, _key: &str) -> Result<(), SessionError> {
            std::future::pending().await
        }
        fn name(&self) -> &'static str {
            "hanging"
        }
    }

    #[tokio::test]
    async fn test_register_then_validate() {
        let store = store_over(Arc::new(MemoryBackend::new()));
        store.register("abc123", Duration::from_secs(60)).await.unwrap();

        let outcome = store.validate("abc123", Duration::from_secs(60)).await.unwrap();
        assert_eq!(outcome, Validation::Refreshed);
    }

    #[tokio::test]
    async fn test_validate_unknown_token_is_not_found_and_creates_nothing() {
        let backend = Arc::new(MemoryBackend::new());
        let store = store_over(backend.clone());

        let err = store.validate("ghost", Duration::from_secs(60)).await.unwrap_err();

        assert_eq!(err, SessionError::NotFound);
        assert!(backend.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sliding_window_replaces_ttl() {
        let backend = Arc::new(MemoryBackend::new());
        let store = store_over(backend.clone());
        store.register("t1", Duration::from_secs(100)).await.unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        store.validate("t1", Duration::from_secs(5)).await.unwrap();

        assert_eq!(backend.ttl("t1").await, Some(Duration::from_secs(5)));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(
            store.validate("t1", Duration::from_secs(5)).await,
            Err(SessionError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let store = store_over(Arc::new(MemoryBackend::new()));
        store.register("t1", Duration::from_secs(60)).await.unwrap();

        store.destroy("t1").await.unwrap();
        store.destroy("t1").await.unwrap();

        assert_eq!(
            store.validate("t1", Duration::from_secs(60)).await,
            Err(SessionError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_refresh_failure_does_not_fail_validation() {
        let backend = Arc::new(BrokenExpire::default());
        let store = store_over(backend.clone());
        store.register("t1", Duration::from_secs(60)).await.unwrap();

        let outcome = store.validate("t1", Duration::from_secs(60)).await.unwrap();

        assert!(!outcome.is_refreshed());
        assert!(matches!(outcome, Validation::RefreshFailed { ref reason } if reason.contains("READONLY")));
        // set_ex, exists, expire
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_backend_times_out_as_unavailable() {
        let store = TokenStore::new(Arc::new(Hanging), Duration::from_millis(250));

        let err = store.validate("t1", Duration::from_secs(60)).await.unwrap_err();
        assert!(matches!(err, SessionError::StoreUnavailable { ref reason } if reason.contains("exists timed out")));

        assert!(matches!(
            store.register("t1", Duration::from_secs(60)).await,
            Err(SessionError::StoreUnavailable { .. })
        ));
        assert!(matches!(
            store.destroy("t1").await,
            Err(SessionError::StoreUnavailable { .. })
        ));
    }
}
