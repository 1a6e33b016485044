//! Error taxonomy for the session service.
//!
//! `NotFound` and `InvalidRequest` are ordinary outcomes ("not logged in",
//! "bad call"). `StoreUnavailable` means the shared store could not answer,
//! which callers must be able to tell apart from `NotFound`.

use thiserror::Error;
use tonic::Status;

/// Session service errors.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Token is absent or already expired
    #[error("access token does not exist")]
    NotFound,

    /// The shared store could not be reached or did not answer in time
    #[error("session store unavailable: {reason}")]
    StoreUnavailable {
        /// Transport-level cause, never the token itself
        reason: String,
    },

    /// Request failed structural validation
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Which field was rejected and why
        reason: String,
    },

    /// Token confirmed live but its TTL could not be reset
    #[error("session refresh failed: {reason}")]
    RefreshFailure {
        /// Cause of the failed reset
        reason: String,
    },
}

impl SessionError {
    /// Build a `StoreUnavailable` error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            reason: reason.into(),
        }
    }

    /// Build an `InvalidRequest` error.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Stable code for log fields and metric labels.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound => SESSION_NOT_FOUND,
            Self::StoreUnavailable { .. } => SESSION_STORE_UNAVAILABLE,
            Self::InvalidRequest { .. } => SESSION_INVALID_REQUEST,
            Self::RefreshFailure { .. } => SESSION_REFRESH_FAILURE,
        }
    }

    /// True when the failure lies with infrastructure rather than the caller.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable { .. } | Self::RefreshFailure { .. }
        )
    }

    /// Convert to a gRPC status. Store internals are not echoed to callers.
    #[must_use]
    pub fn to_status(&self) -> Status {
        match self {
            Self::NotFound => Status::not_found("access token does not exist"),
            Self::StoreUnavailable { .. } => Status::unavailable("session store unavailable"),
            Self::InvalidRequest { reason } => Status::invalid_argument(reason.clone()),
            Self::RefreshFailure { .. } => Status::internal("session refresh failed"),
        }
    }
}

impl From<SessionError> for Status {
    fn from(err: SessionError) -> Self {
        err.to_status()
    }
}

impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        Self::unavailable(err.to_string())
    }
}

// Error codes for log fields and metric labels
/// Token absent or expired.
pub const SESSION_NOT_FOUND: &str = "SESSION_NOT_FOUND";
/// Store unreachable or timed out.
pub const SESSION_STORE_UNAVAILABLE: &str = "SESSION_STORE_UNAVAILABLE";
/// Request rejected before touching the store.
pub const SESSION_INVALID_REQUEST: &str = "SESSION_INVALID_REQUEST";
/// TTL reset failed after a positive existence check.
pub const SESSION_REFRESH_FAILURE: &str = "SESSION_REFRESH_FAILURE";
