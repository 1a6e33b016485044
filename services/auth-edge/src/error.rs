//! Error handling for the edge adapter.
//!
//! Every variant resolves to `Unauthorized` at the proxy. The split between
//! authentication failures and infrastructure failures exists for logs and
//! metrics only.

use rust_common::PlatformError;
use std::time::Duration;
use thiserror::Error;
use tonic::Code;

/// Edge authorization errors.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EdgeError {
    /// Check request carried no path attribute
    #[error("Request path missing")]
    PathMissing,

    /// No `authorization` header
    #[error("Authorization header missing")]
    HeaderMissing,

    /// Header too short or not a Bearer credential
    #[error("Authorization header malformed: {reason}")]
    HeaderMalformed {
        /// What was wrong with the header (never its value)
        reason: &'static str,
    },

    /// Session service does not know the token
    #[error("Token not found")]
    TokenNotFound,

    /// Session service rejected the token as structurally invalid
    #[error("Token malformed")]
    TokenMalformed,

    /// Session service or its store is unavailable
    #[error("Service unavailable: {service}")]
    ServiceUnavailable {
        /// Name of the unavailable service
        service: String,
    },

    /// Call to the session service timed out
    #[error("Operation timed out after {duration:?}")]
    Timeout {
        /// How long the call ran before timing out
        duration: Duration,
    },

    /// Circuit breaker is open
    #[error("Circuit breaker open for service: {service}")]
    CircuitOpen {
        /// Name of the service with open circuit
        service: String,
    },

    /// Anything else (details never reach the proxy)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for logs and metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Path attribute absent
    PathMissing,
    /// Header absent
    HeaderMissing,
    /// Header unusable
    HeaderMalformed,
    /// Token not live
    TokenNotFound,
    /// Token rejected by the session service
    TokenMalformed,
    /// Dependency down
    ServiceUnavailable,
    /// Dependency too slow
    Timeout,
    /// Breaker open
    CircuitOpen,
    /// Unclassified
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PathMissing => "EDGE_PATH_MISSING",
            Self::HeaderMissing => "EDGE_HEADER_MISSING",
            Self::HeaderMalformed => "EDGE_HEADER_MALFORMED",
            Self::TokenNotFound => "EDGE_TOKEN_NOT_FOUND",
            Self::TokenMalformed => "EDGE_TOKEN_MALFORMED",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::Timeout => "TIMEOUT",
            Self::CircuitOpen => "CIRCUIT_OPEN",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

impl EdgeError {
    /// Get the error code for this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::PathMissing => ErrorCode::PathMissing,
            Self::HeaderMissing => ErrorCode::HeaderMissing,
            Self::HeaderMalformed { .. } => ErrorCode::HeaderMalformed,
            Self::TokenNotFound => ErrorCode::TokenNotFound,
            Self::TokenMalformed => ErrorCode::TokenMalformed,
            Self::ServiceUnavailable { .. } => ErrorCode::ServiceUnavailable,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::CircuitOpen { .. } => ErrorCode::CircuitOpen,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// True when the check could not be completed, as opposed to the caller
    /// failing authentication.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable { .. }
                | Self::Timeout { .. }
                | Self::CircuitOpen { .. }
                | Self::Internal(_)
        )
    }

    /// Whether the session breaker should count this as a failure.
    ///
    /// A token that is simply not live is a healthy answer.
    #[must_use]
    pub const fn trips_breaker(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable { .. } | Self::Timeout { .. } | Self::Internal(_)
        )
    }
}

impl From<tonic::Status> for EdgeError {
    fn from(status: tonic::Status) -> Self {
        match status.code() {
            Code::NotFound => EdgeError::TokenNotFound,
            Code::InvalidArgument => EdgeError::TokenMalformed,
            Code::Unavailable => EdgeError::ServiceUnavailable {
                service: "session".to_string(),
            },
            Code::DeadlineExceeded => EdgeError::Timeout {
                duration: Duration::ZERO,
            },
            _ => EdgeError::Internal(format!("gRPC error {:?}: {}", status.code(), status.message())),
        }
    }
}

impl From<tonic::transport::Error> for EdgeError {
    fn from(err: tonic::transport::Error) -> Self {
        EdgeError::ServiceUnavailable {
            service: format!("session ({err})"),
        }
    }
}

impl From<PlatformError> for EdgeError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::CircuitOpen { service } => EdgeError::CircuitOpen { service },
            other => EdgeError::Internal(other.to_string()),
        }
    }
}

impl From<session_service::SessionError> for EdgeError {
    fn from(err: session_service::SessionError) -> Self {
        use session_service::SessionError;

        match err {
            SessionError::NotFound => EdgeError::TokenNotFound,
            SessionError::InvalidRequest { .. } => EdgeError::TokenMalformed,
            SessionError::StoreUnavailable { .. } => EdgeError::ServiceUnavailable {
                service: "session-store".to_string(),
            },
            other => EdgeError::Internal(other.to_string()),
        }
    }
}
