//! State machine tests for `EdgeAuthorizer::check` against a mocked
//! session authority.

use async_trait::async_trait;
use auth_edge::proto::envoy::service::auth::v3::attribute_context::{HttpRequest, Request};
use auth_edge::proto::envoy::service::auth::v3::{AttributeContext, CheckRequest};
use auth_edge::{
    AccessPolicy, AuthorizationDecision, EdgeAuthorizer, EdgeError, RequestContext,
    SessionAuthority,
};
use mockall::mock;
use mockall::predicate::eq;
use session_service::WhitelistMatcher;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use test_utils::fixtures::EDGE_AUTH_DURATION_SECS;

mock! {
    pub Authority {}

    #[async_trait]
    impl SessionAuthority for Authority {
        async fn get_auth(&self, token: &str, duration_secs: i64) -> Result<(), EdgeError>;
    }
}

struct DenyAll;

#[async_trait]
impl AccessPolicy for DenyAll {
    async fn permits(&self, _request: &RequestContext<'_>) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "deny-all"
    }
}

fn check_request(path: &str, authorization: Option<&str>) -> CheckRequest {
    let mut headers = HashMap::new();
    if let Some(value) = authorization {
        headers.insert("authorization".to_string(), value.to_string());
    }
    CheckRequest {
        attributes: Some(AttributeContext {
            request: Some(Request {
                http: Some(HttpRequest {
                    method: "GET".to_string(),
                    path: path.to_string(),
                    headers,
                    ..Default::default()
                }),
            }),
        }),
    }
}

fn authorizer(authority: MockAuthority) -> EdgeAuthorizer {
    EdgeAuthorizer::new(
        Arc::new(WhitelistMatcher::new(["/svc/Method"])),
        Arc::new(authority),
        EDGE_AUTH_DURATION_SECS,
    )
}

/// Authority that must never be called.
fn untouched() -> MockAuthority {
    let mut authority = MockAuthority::new();
    authority.expect_get_auth().never();
    authority
}

#[tokio::test]
async fn test_whitelisted_path_allowed_without_header() {
    let edge = authorizer(untouched());

    assert_eq!(
        edge.check(&check_request("/svc/Method", None)).await,
        AuthorizationDecision::Allow
    );
    assert_eq!(
        edge.check(&check_request("/svc/Method", Some(""))).await,
        AuthorizationDecision::Allow
    );
    assert_eq!(
        edge.check(&check_request("/svc/Method", Some("garbage"))).await,
        AuthorizationDecision::Allow
    );
}

#[tokio::test]
async fn test_missing_header_is_unauthorized() {
    let edge = authorizer(untouched());

    assert_eq!(
        edge.check(&check_request("/svc/Other", None)).await,
        AuthorizationDecision::Unauthorized
    );
    assert_eq!(
        edge.check(&check_request("/svc/Other", Some(""))).await,
        AuthorizationDecision::Unauthorized
    );
}

#[tokio::test]
async fn test_short_header_never_reaches_store() {
    let edge = authorizer(untouched());

    for header in ["Bear", "Bearer", "Bearer "] {
        assert_eq!(
            edge.check(&check_request("/svc/Other", Some(header))).await,
            AuthorizationDecision::Unauthorized,
            "header {header:?}"
        );
    }
}

#[tokio::test]
async fn test_non_bearer_scheme_rejected() {
    let edge = authorizer(untouched());

    let err = edge
        .evaluate(&check_request("/svc/Other", Some("Basic dXNlcjpwYXNz")))
        .await
        .unwrap_err();
    assert!(matches!(err, EdgeError::HeaderMalformed { .. }));
}

#[tokio::test]
async fn test_missing_path_is_unauthorized() {
    let edge = authorizer(untouched());

    assert_eq!(
        edge.check(&CheckRequest::default()).await,
        AuthorizationDecision::Unauthorized
    );
    assert_eq!(
        edge.check(&check_request("", Some("Bearer abc123"))).await,
        AuthorizationDecision::Unauthorized
    );
}

#[tokio::test]
async fn test_live_token_allowed_with_fixed_duration() {
    let mut authority = MockAuthority::new();
    authority
        .expect_get_auth()
        .with(eq("abc123"), eq(EDGE_AUTH_DURATION_SECS))
        .times(1)
        .returning(|_, _| Ok(()));
    let edge = authorizer(authority);

    assert_eq!(
        edge.check(&check_request("/svc/Other", Some("Bearer abc123"))).await,
        AuthorizationDecision::Allow
    );
}

#[tokio::test]
async fn test_scheme_is_case_insensitive() {
    let mut authority = MockAuthority::new();
    authority
        .expect_get_auth()
        .with(eq("abc123"), eq(EDGE_AUTH_DURATION_SECS))
        .times(1)
        .returning(|_, _| Ok(()));
    let edge = authorizer(authority);

    assert_eq!(
        edge.check(&check_request("/svc/Other", Some("bEaReR abc123"))).await,
        AuthorizationDecision::Allow
    );
}

#[tokio::test]
async fn test_every_session_failure_denies() {
    let failures = [
        EdgeError::TokenNotFound,
        EdgeError::TokenMalformed,
        EdgeError::ServiceUnavailable {
            service: "session".to_string(),
        },
        EdgeError::Timeout {
            duration: Duration::from_secs(3),
        },
        EdgeError::CircuitOpen {
            service: "session".to_string(),
        },
        EdgeError::Internal("boom".to_string()),
    ];

    for failure in failures {
        let mut authority = MockAuthority::new();
        let returned = failure.clone();
        authority
            .expect_get_auth()
            .times(1)
            .returning(move |_, _| Err(returned.clone()));
        let edge = authorizer(authority);

        assert_eq!(
            edge.check(&check_request("/svc/Other", Some("Bearer abc123"))).await,
            AuthorizationDecision::Unauthorized,
            "{failure:?} was not denied"
        );
    }
}

#[tokio::test]
async fn test_policy_denial_is_forbidden() {
    let mut authority = MockAuthority::new();
    authority.expect_get_auth().times(1).returning(|_, _| Ok(()));
    let edge = authorizer(authority).with_policy(Arc::new(DenyAll));

    assert_eq!(
        edge.check(&check_request("/svc/Other", Some("Bearer abc123"))).await,
        AuthorizationDecision::Forbidden
    );
}

#[tokio::test]
async fn test_policy_not_consulted_for_dead_token() {
    let mut authority = MockAuthority::new();
    authority
        .expect_get_auth()
        .times(1)
        .returning(|_, _| Err(EdgeError::TokenNotFound));
    let edge = authorizer(authority).with_policy(Arc::new(DenyAll));

    assert_eq!(
        edge.check(&check_request("/svc/Other", Some("Bearer abc123"))).await,
        AuthorizationDecision::Unauthorized
    );
}

#[tokio::test]
async fn test_whitelist_ignores_query_string() {
    let edge = authorizer(untouched());

    assert_eq!(
        edge.check(&check_request("/svc/Method?debug=1", None)).await,
        AuthorizationDecision::Allow
    );
}
