//! AuthDecisionService: the direct session RPC surface.
//!
//! Callers are identity-owning services. Login registers a token, logout
//! destroys it, and every authenticated request validates it, which also
//! slides its expiration.

use crate::error::SessionError;
use crate::storage::{TokenStore, Validation};
use crate::validation::checked_duration;
use crate::whitelist::WhitelistMatcher;
use std::sync::Arc;
use std::time::Duration;

/// Session operations over a shared [`TokenStore`] and [`WhitelistMatcher`].
#[derive(Clone)]
pub struct AuthDecisionService {
    store: Arc<TokenStore>,
    whitelist: Arc<WhitelistMatcher>,
}

impl AuthDecisionService {
    /// Wire the service to its collaborators.
    #[must_use]
    pub fn new(store: Arc<TokenStore>, whitelist: Arc<WhitelistMatcher>) -> Self {
        Self { store, whitelist }
    }

    /// Mark `token` live for `duration_secs` seconds.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an empty token or non-positive duration,
    /// `StoreUnavailable` if the store fails.
    pub async fn register_auth(&self, token: &str, duration_secs: i64) -> Result<(), SessionError> {
        let ttl = checked_ttl(token, duration_secs)?;
        self.store.register(token, ttl).await
    }

    /// Confirm `token` is live and extend it by `duration_secs` from now.
    ///
    /// # Errors
    ///
    /// `NotFound` if the token is not live, `InvalidRequest` for bad input,
    /// `StoreUnavailable` if existence could not be checked.
    pub async fn get_auth(
        &self,
        token: &str,
        duration_secs: i64,
    ) -> Result<Validation, SessionError> {
        let ttl = checked_ttl(token, duration_secs)?;
        self.store.validate(token, ttl).await
    }

    /// Forget `token`. Destroying an unknown token succeeds.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an empty token, `StoreUnavailable` if the store
    /// fails.
    pub async fn destroy_auth(&self, token: &str) -> Result<(), SessionError> {
        if token.is_empty() {
            return Err(SessionError::invalid("access_token must not be empty"));
        }
        self.store.destroy(token).await
    }

    /// Whether `identifier` bypasses authentication. Never touches the store.
    #[must_use]
    pub fn is_api_whitelisted(&self, identifier: &str) -> bool {
        self.whitelist.is_whitelisted(identifier)
    }
}

fn checked_ttl(token: &str, duration_secs: i64) -> Result<Duration, SessionError> {
    if token.is_empty() {
        return Err(SessionError::invalid("access_token must not be empty"));
    }
    checked_duration(duration_secs)
}
