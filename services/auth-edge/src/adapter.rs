//! Edge authorization state machine.
//!
//! One linear pass per request:
//! path → whitelist → header → Bearer prefix → token liveness → policy.
//! Anything that cannot be positively confirmed resolves to `Unauthorized`.

use crate::authority::SessionAuthority;
use crate::decision::AuthorizationDecision;
use crate::error::EdgeError;
use crate::observability::EdgeMetrics;
use crate::policy::{AccessPolicy, PermitAll, RequestContext};
use crate::proto::envoy::service::auth::v3::attribute_context::HttpRequest;
use crate::proto::envoy::service::auth::v3::CheckRequest;
use session_service::WhitelistMatcher;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

const AUTHORIZATION_HEADER: &str = "authorization";
const BEARER_PREFIX: &str = "Bearer ";

/// Why a request was allowed.
const REASON_WHITELISTED: &str = "whitelisted";
const REASON_AUTHENTICATED: &str = "authenticated";
const REASON_POLICY_DENIED: &str = "policy_denied";

/// Proxy-facing authorizer.
#[derive(Clone)]
pub struct EdgeAuthorizer {
    whitelist: Arc<WhitelistMatcher>,
    authority: Arc<dyn SessionAuthority>,
    policy: Arc<dyn AccessPolicy>,
    auth_duration_secs: i64,
    metrics: Option<EdgeMetrics>,
}

impl EdgeAuthorizer {
    /// Authorizer with the permit-all policy and no metrics.
    ///
    /// `auth_duration_secs` is the TTL every successful check slides the
    /// token to.
    #[must_use]
    pub fn new(
        whitelist: Arc<WhitelistMatcher>,
        authority: Arc<dyn SessionAuthority>,
        auth_duration_secs: i64,
    ) -> Self {
        Self {
            whitelist,
            authority,
            policy: Arc::new(PermitAll),
            auth_duration_secs,
            metrics: None,
        }
    }

    /// Replace the access policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Record decisions into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: EdgeMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Decide a single request. Never fails: errors become `Unauthorized`.
    pub async fn check(&self, request: &CheckRequest) -> AuthorizationDecision {
        let started = Instant::now();
        let _in_flight = InFlight::enter(self.metrics.as_ref());

        let (decision, reason) = match self.evaluate(request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let code = err.code().as_str();
                if err.is_infrastructure() {
                    error!(error_code = code, error = %err, "Authorization check failed, denying");
                } else {
                    info!(error_code = code, "Request not authenticated");
                }
                (AuthorizationDecision::Unauthorized, code)
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_decision(decision, reason, started.elapsed().as_secs_f64());
        }
        decision
    }

    /// Run the state machine, surfacing why a request was not allowed.
    ///
    /// # Errors
    ///
    /// The first step that failed. Callers must treat every error as
    /// `Unauthorized`.
    pub async fn evaluate(
        &self,
        request: &CheckRequest,
    ) -> Result<(AuthorizationDecision, &'static str), EdgeError> {
        let http = http_attributes(request).ok_or(EdgeError::PathMissing)?;
        let path = request_path(&http.path).ok_or(EdgeError::PathMissing)?;

        if self.whitelist.is_whitelisted(path) {
            debug!(path, "Whitelisted request");
            return Ok((AuthorizationDecision::Allow, REASON_WHITELISTED));
        }

        let header = authorization_header(&http.headers).ok_or(EdgeError::HeaderMissing)?;
        let token = bearer_token(header)?;

        self.authority.get_auth(token, self.auth_duration_secs).await?;

        let context = RequestContext {
            path,
            method: &http.method,
            headers: &http.headers,
        };
        if self.policy.permits(&context).await {
            Ok((AuthorizationDecision::Allow, REASON_AUTHENTICATED))
        } else {
            info!(path, policy = self.policy.name(), "Request denied by policy");
            Ok((AuthorizationDecision::Forbidden, REASON_POLICY_DENIED))
        }
    }
}

/// Holds one `active_checks` slot until dropped, so cancelled checks
/// release it too.
struct InFlight<'a>(Option<&'a EdgeMetrics>);

impl<'a> InFlight<'a> {
    fn enter(metrics: Option<&'a EdgeMetrics>) -> Self {
        if let Some(metrics) = metrics {
            metrics.active_checks.inc();
        }
        Self(metrics)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(metrics) = self.0 {
            metrics.active_checks.dec();
        }
    }
}

fn http_attributes(request: &CheckRequest) -> Option<&HttpRequest> {
    request
        .attributes
        .as_ref()?
        .request
        .as_ref()?
        .http
        .as_ref()
}

/// Path without query string or fragment; `None` when empty.
fn request_path(raw: &str) -> Option<&str> {
    let end = raw.find(|c| c == '?' || c == '#').unwrap_or(raw.len());
    Some(&raw[..end]).filter(|path| !path.is_empty())
}

/// `authorization` header value; `None` when absent or empty.
fn authorization_header(headers: &HashMap<String, String>) -> Option<&str> {
    headers
        .get(AUTHORIZATION_HEADER)
        .or_else(|| {
            headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION_HEADER))
                .map(|(_, value)| value)
        })
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

/// Strip a case-insensitive `Bearer ` prefix.
///
/// # Errors
///
/// `HeaderMalformed` if the header is not longer than the prefix or does
/// not start with it.
pub fn bearer_token(header: &str) -> Result<&str, EdgeError> {
    if header.len() <= BEARER_PREFIX.len() {
        return Err(EdgeError::HeaderMalformed {
            reason: "shorter than Bearer prefix",
        });
    }
    match header.get(..BEARER_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(BEARER_PREFIX) => {
            Ok(&header[BEARER_PREFIX.len()..])
        }
        _ => Err(EdgeError::HeaderMalformed {
            reason: "not a Bearer credential",
        }),
    }
}
