//! gRPC Service Implementation
//!
//! Adapts [`AuthDecisionService`] to the generated `auth.v1.AuthService`
//! server trait. Validation runs first, then the service call; errors are
//! logged by code and converted to a status without store internals.

use crate::error::SessionError;
use crate::metrics::record_rpc;
use crate::proto::auth::v1::auth_service_server::AuthService;
use crate::proto::auth::v1::*;
use crate::service::AuthDecisionService;
use crate::storage::Validation;
use crate::validation::accept;
use std::time::Instant;
use tonic::{Request, Response, Status};
use tracing::{error, info, instrument, warn, Span};
use uuid::Uuid;

/// `auth.v1.AuthService` server.
#[derive(Clone)]
pub struct AuthServiceImpl {
    service: AuthDecisionService,
}

impl AuthServiceImpl {
    /// Serve RPCs from `service`.
    #[must_use]
    pub fn new(service: AuthDecisionService) -> Self {
        Self { service }
    }

    /// Generates a new correlation ID for request tracing.
    fn generate_correlation_id() -> Uuid {
        Uuid::new_v4()
    }

    /// Log, count and convert a failed call.
    fn reject(method: &'static str, started: Instant, err: &SessionError) -> Status {
        record_rpc(method, err.code(), started.elapsed().as_secs_f64());
        if err.is_infrastructure() {
            error!(method, error_code = err.code(), error = %err, "Session RPC failed");
        } else {
            info!(method, error_code = err.code(), "Session RPC rejected");
        }
        err.to_status()
    }

    fn rejected_input(method: &'static str, started: Instant, status: Status) -> Status {
        record_rpc(method, crate::error::SESSION_INVALID_REQUEST, started.elapsed().as_secs_f64());
        info!(method, reason = status.message(), "Session RPC failed validation");
        status
    }
}

#[tonic::async_trait]
impl AuthService for AuthServiceImpl {
    #[instrument(
        skip(self, request),
        fields(correlation_id = %Self::generate_correlation_id(), duration = tracing::field::Empty)
    )]
    async fn register_auth(
        &self,
        request: Request<RegisterAuthRequest>,
    ) -> Result<Response<RegisterAuthResponse>, Status> {
        const METHOD: &str = "RegisterAuth";
        let started = Instant::now();
        let req = accept(request).map_err(|s| Self::rejected_input(METHOD, started, s))?;
        Span::current().record("duration", req.duration);

        self.service
            .register_auth(&req.access_token, req.duration)
            .await
            .map_err(|e| Self::reject(METHOD, started, &e))?;

        record_rpc(METHOD, "OK", started.elapsed().as_secs_f64());
        info!("Token registered");
        Ok(Response::new(RegisterAuthResponse { success: true }))
    }

    #[instrument(
        skip(self, request),
        fields(correlation_id = %Self::generate_correlation_id())
    )]
    async fn get_auth(
        &self,
        request: Request<GetAuthRequest>,
    ) -> Result<Response<GetAuthResponse>, Status> {
        const METHOD: &str = "GetAuth";
        let started = Instant::now();
        let req = accept(request).map_err(|s| Self::rejected_input(METHOD, started, s))?;

        let outcome = self
            .service
            .get_auth(&req.access_token, req.duration)
            .await
            .map_err(|e| Self::reject(METHOD, started, &e))?;

        let code = match outcome {
            Validation::Refreshed => "OK",
            Validation::RefreshFailed { .. } => {
                warn!("Token live, expiration not extended");
                crate::error::SESSION_REFRESH_FAILURE
            }
        };
        record_rpc(METHOD, code, started.elapsed().as_secs_f64());
        Ok(Response::new(GetAuthResponse { success: true }))
    }

    #[instrument(
        skip(self, request),
        fields(correlation_id = %Self::generate_correlation_id())
    )]
    async fn destroy_auth(
        &self,
        request: Request<DestroyAuthRequest>,
    ) -> Result<Response<DestroyAuthResponse>, Status> {
        const METHOD: &str = "DestroyAuth";
        let started = Instant::now();
        let req = accept(request).map_err(|s| Self::rejected_input(METHOD, started, s))?;

        self.service
            .destroy_auth(&req.access_token)
            .await
            .map_err(|e| Self::reject(METHOD, started, &e))?;

        record_rpc(METHOD, "OK", started.elapsed().as_secs_f64());
        info!("Token destroyed");
        Ok(Response::new(DestroyAuthResponse { success: true }))
    }

    #[instrument(
        skip(self, request),
        fields(correlation_id = %Self::generate_correlation_id())
    )]
    async fn is_api_white_list(
        &self,
        request: Request<IsApiWhiteListRequest>,
    ) -> Result<Response<IsApiWhiteListResponse>, Status> {
        const METHOD: &str = "IsApiWhiteList";
        let started = Instant::now();
        let req = accept(request).map_err(|s| Self::rejected_input(METHOD, started, s))?;

        let success = self.service.is_api_whitelisted(&req.full_method_name);

        record_rpc(METHOD, "OK", started.elapsed().as_secs_f64());
        Ok(Response::new(IsApiWhiteListResponse { success }))
    }
}
