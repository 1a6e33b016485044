//! Shared library for cross-cutting concerns in the session platform services.
//!
//! This crate provides centralized implementations for:
//! - A shared error type for the helpers below
//! - Circuit breaker pattern for calls to shared infrastructure
//! - Tracing subscriber setup (plain or JSON output)
//! - Graceful shutdown on SIGINT/SIGTERM

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod circuit_breaker;
pub mod error;
pub mod shutdown;
pub mod tracing_config;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use error::PlatformError;
pub use shutdown::{run_with_graceful_shutdown, ShutdownCoordinator, ShutdownSignal};
pub use tracing_config::{init_tracing, TracingConfig};
