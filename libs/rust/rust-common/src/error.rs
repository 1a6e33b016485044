//! Centralized error types for the platform libraries.
//!
//! Services keep their own domain errors and convert from `PlatformError`
//! where a shared helper (circuit breaker, tracing setup, server runner)
//! fails.

use thiserror::Error;

/// Common error type for platform operations.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Circuit breaker is open for the specified dependency
    #[error("Circuit breaker open for {service}")]
    CircuitOpen {
        /// The dependency that has an open circuit
        service: String,
    },

    /// Tracing subscriber could not be installed
    #[error("Telemetry setup failed: {0}")]
    Telemetry(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlatformError {
    /// Create a circuit open error for the given dependency.
    #[must_use]
    pub fn circuit_open(service: impl Into<String>) -> Self {
        Self::CircuitOpen {
            service: service.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlatformError::circuit_open("session-service");
        assert_eq!(err.to_string(), "Circuit breaker open for session-service");

        let err = PlatformError::Internal("server error: address in use".to_string());
        assert_eq!(err.to_string(), "Internal error: server error: address in use");
    }
}
