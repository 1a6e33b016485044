//! gRPC Service Implementation
//!
//! Implements `envoy.service.auth.v3.Authorization/Check`. Denials are
//! ordinary responses; the handler never returns an error status, so the
//! proxy always receives a decision it can enforce.

use crate::adapter::EdgeAuthorizer;
use crate::proto::envoy::service::auth::v3::authorization_server::Authorization;
use crate::proto::envoy::service::auth::v3::{CheckRequest, CheckResponse};
use tonic::{Request, Response, Status};
use tracing::{debug, instrument, Span};
use uuid::Uuid;

/// Authorization server backed by an [`EdgeAuthorizer`].
#[derive(Clone)]
pub struct AuthorizationServiceImpl {
    authorizer: EdgeAuthorizer,
}

impl AuthorizationServiceImpl {
    /// Serve checks from `authorizer`.
    #[must_use]
    pub fn new(authorizer: EdgeAuthorizer) -> Self {
        Self { authorizer }
    }

    /// Generates a new correlation ID for request tracing.
    fn generate_correlation_id() -> Uuid {
        Uuid::new_v4()
    }
}

#[tonic::async_trait]
impl Authorization for AuthorizationServiceImpl {
    #[instrument(
        skip(self, request),
        fields(
            correlation_id = %Self::generate_correlation_id(),
            request_id = tracing::field::Empty,
            decision = tracing::field::Empty,
        )
    )]
    async fn check(
        &self,
        request: Request<CheckRequest>,
    ) -> Result<Response<CheckResponse>, Status> {
        let req = request.into_inner();

        if let Some(http) = req
            .attributes
            .as_ref()
            .and_then(|a| a.request.as_ref())
            .and_then(|r| r.http.as_ref())
        {
            Span::current().record("request_id", http.id.as_str());
        }

        let decision = self.authorizer.check(&req).await;

        Span::current().record("decision", decision.as_str());
        debug!(status = decision.http_status(), "Check complete");

        Ok(Response::new(decision.to_check_response()))
    }
}
