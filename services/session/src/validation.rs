//! Structural validation of inbound RPC requests.
//!
//! Every handler goes through [`accept`] before touching the store, so a
//! malformed call never costs a round trip.

use crate::error::SessionError;
use crate::proto::auth::v1::{
    DestroyAuthRequest, GetAuthRequest, IsApiWhiteListRequest, RegisterAuthRequest,
};
use std::time::Duration;
use tonic::{Request, Status};

/// Longest TTL a session may be given: ten years.
pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Request-level validation.
pub trait Validate {
    /// Check the request's fields.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` naming the offending field.
    fn validate(&self) -> Result<(), SessionError>;
}

fn require_token(access_token: &str) -> Result<(), SessionError> {
    if access_token.is_empty() {
        return Err(SessionError::invalid("access_token must not be empty"));
    }
    Ok(())
}

/// Convert a requested TTL in seconds, rejecting anything outside
/// `1..=MAX_TTL_SECS`.
pub(crate) fn checked_duration(duration: i64) -> Result<Duration, SessionError> {
    if !(1..=MAX_TTL_SECS).contains(&duration) {
        return Err(SessionError::invalid(format!(
            "duration must be between 1 and {MAX_TTL_SECS} seconds, got {duration}"
        )));
    }
    Ok(Duration::from_secs(duration.unsigned_abs()))
}

fn require_duration(duration: i64) -> Result<(), SessionError> {
    checked_duration(duration).map(drop)
}

impl Validate for RegisterAuthRequest {
    fn validate(&self) -> Result<(), SessionError> {
        require_token(&self.access_token)?;
        require_duration(self.duration)
    }
}

impl Validate for GetAuthRequest {
    fn validate(&self) -> Result<(), SessionError> {
        require_token(&self.access_token)?;
        require_duration(self.duration)
    }
}

impl Validate for DestroyAuthRequest {
    fn validate(&self) -> Result<(), SessionError> {
        require_token(&self.access_token)
    }
}

impl Validate for IsApiWhiteListRequest {
    fn validate(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Unwrap a request, rejecting it with `INVALID_ARGUMENT` if it does not
/// validate.
///
/// # Errors
///
/// The validation failure as a gRPC status.
pub fn accept<T: Validate>(request: Request<T>) -> Result<T, Status> {
    let inner = request.into_inner();
    inner.validate()?;
    Ok(inner)
}
