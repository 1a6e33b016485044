//! Token liveness checks against the session service.

use crate::error::EdgeError;
use crate::observability::EdgeMetrics;
use async_trait::async_trait;
use rust_common::CircuitBreaker;
use session_service::proto::auth::v1::auth_service_client::AuthServiceClient;
use session_service::proto::auth::v1::GetAuthRequest;
use session_service::AuthDecisionService;
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;
use url::Url;

/// Answers "is this token live?" and slides its expiration.
#[async_trait]
pub trait SessionAuthority: Send + Sync {
    /// Validate `token`, extending it to `duration_secs` from now.
    ///
    /// # Errors
    ///
    /// `TokenNotFound` when the token is not live; any infrastructure
    /// failure otherwise.
    async fn get_auth(&self, token: &str, duration_secs: i64) -> Result<(), EdgeError>;
}

/// Session service reached over gRPC.
pub struct RemoteSessionAuthority {
    client: AuthServiceClient<Channel>,
    breaker: Arc<CircuitBreaker>,
    request_timeout: Duration,
    metrics: Option<EdgeMetrics>,
}

impl RemoteSessionAuthority {
    /// Build a client that dials on first use.
    ///
    /// # Errors
    ///
    /// `ServiceUnavailable` if `url` is not a usable endpoint.
    pub fn connect_lazy(
        url: &Url,
        connect_timeout: Duration,
        request_timeout: Duration,
        breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, EdgeError> {
        let channel = Endpoint::from_shared(url.to_string())?
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .connect_lazy();

        Ok(Self {
            client: AuthServiceClient::new(channel),
            breaker,
            request_timeout,
            metrics: None,
        })
    }

    /// Publish breaker state into `metrics` after every call.
    #[must_use]
    pub fn with_metrics(mut self, metrics: EdgeMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Breaker guarding the session service.
    #[must_use]
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}

#[async_trait]
impl SessionAuthority for RemoteSessionAuthority {
    async fn get_auth(&self, token: &str, duration_secs: i64) -> Result<(), EdgeError> {
        self.breaker.try_acquire()?;

        let mut client = self.client.clone();
        let request = tonic::Request::new(GetAuthRequest {
            access_token: token.to_string(),
            duration: duration_secs,
        });

        let result = match tokio::time::timeout(self.request_timeout, client.get_auth(request)).await
        {
            Ok(Ok(response)) if response.get_ref().success => Ok(()),
            Ok(Ok(_)) => Err(EdgeError::TokenNotFound),
            Ok(Err(status)) => Err(EdgeError::from(status)),
            Err(_) => Err(EdgeError::Timeout {
                duration: self.request_timeout,
            }),
        };

        match &result {
            Err(err) if err.trips_breaker() => {
                debug!(error_code = err.code().as_str(), "Session call failed");
                self.breaker.record_failure();
            }
            _ => self.breaker.record_success(),
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_circuit_state(self.breaker.name(), self.breaker.state());
        }
        result
    }
}

/// Session service running in the same process.
#[derive(Clone)]
pub struct LocalSessionAuthority {
    service: AuthDecisionService,
}

impl LocalSessionAuthority {
    /// Wrap an in-process service.
    #[must_use]
    pub fn new(service: AuthDecisionService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl SessionAuthority for LocalSessionAuthority {
    async fn get_auth(&self, token: &str, duration_secs: i64) -> Result<(), EdgeError> {
        self.service.get_auth(token, duration_secs).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_common::{CircuitBreakerConfig, CircuitState};
    use session_service::{MemoryBackend, TokenStore, WhitelistMatcher};

    fn local() -> (AuthDecisionService, LocalSessionAuthority) {
        let store = TokenStore::new(Arc::new(MemoryBackend::new()), Duration::from_secs(1));
        let service =
            AuthDecisionService::new(Arc::new(store), Arc::new(WhitelistMatcher::default()));
        (service.clone(), LocalSessionAuthority::new(service))
    }

    #[tokio::test]
    async fn test_local_authority_follows_store() {
        let (service, authority) = local();
        assert_eq!(
            authority.get_auth("tok", 60).await,
            Err(EdgeError::TokenNotFound)
        );

        service.register_auth("tok", 60).await.unwrap();
        assert!(authority.get_auth("tok", 60).await.is_ok());
    }

    #[tokio::test]
    async fn test_remote_authority_unreachable_opens_breaker() {
        let breaker = Arc::new(CircuitBreaker::new(
            "session",
            CircuitBreakerConfig::default().with_failure_threshold(2),
        ));
        // Port 9 (discard) refuses connections on a typical test host.
        let url = Url::parse("http://127.0.0.1:9").unwrap();
        let authority = RemoteSessionAuthority::connect_lazy(
            &url,
            Duration::from_millis(200),
            Duration::from_millis(500),
            breaker.clone(),
        )
        .unwrap();

        for _ in 0..2 {
            let err = authority.get_auth("tok", 60).await.unwrap_err();
            assert!(err.is_infrastructure(), "unexpected {err:?}");
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        let err = authority.get_auth("tok", 60).await.unwrap_err();
        assert!(matches!(err, EdgeError::CircuitOpen { .. }));
    }
}
