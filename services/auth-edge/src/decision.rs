//! Terminal decisions returned to the proxy.

use crate::proto::envoy::service::auth::v3::{
    check_response::HttpResponse, CheckResponse, DeniedHttpResponse, HeaderValue,
    HeaderValueOption, HttpStatus, OkHttpResponse, RpcStatus,
};
use serde_json::json;
use tonic::Code;

/// Message sent with a 401.
pub const UNAUTHORIZED_MESSAGE: &str = "Please log in first";
/// Message sent with a 403.
pub const FORBIDDEN_MESSAGE: &str = "Permission denied";

/// Outcome of a single `Check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationDecision {
    /// Forward the request unmodified
    Allow,
    /// Not authenticated (HTTP 401)
    Unauthorized,
    /// Authenticated but not permitted (HTTP 403)
    Forbidden,
}

impl AuthorizationDecision {
    /// HTTP status the proxy should present.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Allow => 200,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
        }
    }

    /// Metric label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
        }
    }

    const fn rpc_code(&self) -> Code {
        match self {
            Self::Allow => Code::Ok,
            Self::Unauthorized => Code::Unauthenticated,
            Self::Forbidden => Code::PermissionDenied,
        }
    }

    const fn message(&self) -> Option<&'static str> {
        match self {
            Self::Allow => None,
            Self::Unauthorized => Some(UNAUTHORIZED_MESSAGE),
            Self::Forbidden => Some(FORBIDDEN_MESSAGE),
        }
    }

    /// JSON body for denials: `{"code": <status>, "msg": .., "data": {}}`.
    #[must_use]
    pub fn body(&self) -> Option<String> {
        self.message().map(|msg| {
            json!({
                "code": self.http_status(),
                "msg": msg,
                "data": {},
            })
            .to_string()
        })
    }

    /// Wire form of the decision.
    #[must_use]
    pub fn to_check_response(&self) -> CheckResponse {
        let http_response = match self.body() {
            None => HttpResponse::OkResponse(OkHttpResponse::default()),
            Some(body) => HttpResponse::DeniedResponse(DeniedHttpResponse {
                status: Some(HttpStatus {
                    code: i32::from(self.http_status()),
                }),
                headers: vec![HeaderValueOption {
                    header: Some(HeaderValue {
                        key: "content-type".to_string(),
                        value: "application/json".to_string(),
                    }),
                }],
                body,
            }),
        };

        CheckResponse {
            status: Some(RpcStatus {
                code: self.rpc_code() as i32,
                message: self.message().unwrap_or_default().to_string(),
            }),
            http_response: Some(http_response),
        }
    }
}

impl From<AuthorizationDecision> for CheckResponse {
    fn from(decision: AuthorizationDecision) -> Self {
        decision.to_check_response()
    }
}
