//! Circuit breaker for calls to shared infrastructure.
//!
//! Protects a caller from piling requests onto a dependency that is already
//! failing. While the circuit is open, calls fail fast with
//! [`PlatformError::CircuitOpen`] instead of waiting for a deadline.

use crate::PlatformError;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests flow normally
    Closed,
    /// Failure threshold exceeded, requests are rejected
    Open,
    /// Probing recovery with a limited number of requests
    HalfOpen,
}

impl CircuitState {
    /// Lowercase label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: u32,
    /// Consecutive successes in half-open state before closing the circuit
    pub success_threshold: u32,
    /// Time the circuit stays open before probing
    pub timeout: Duration,
    /// Maximum probe requests admitted while half-open
    pub half_open_max_requests: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(30),
            half_open_max_requests: 3,
        }
    }
}

impl CircuitBreakerConfig {
    /// Set the failure threshold.
    #[must_use]
    pub const fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the open-state timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    failures: u32,
    successes: u32,
    half_open_requests: u32,
    opened_at: Option<Instant>,
    probing_since: Option<Instant>,
}

/// Circuit breaker guarding a single named dependency.
///
/// All bookkeeping lives behind one short-lived lock; no guard is ever held
/// across an `.await`.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a circuit breaker for the named dependency.
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                half_open_requests: 0,
                opened_at: None,
                probing_since: None,
            }),
        }
    }

    /// Name of the guarded dependency.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if a request may proceed.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.config.timeout);
                if elapsed {
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    inner.half_open_requests = 1;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if inner.half_open_requests < self.config.half_open_max_requests {
                    inner.half_open_requests += 1;
                    true
                } else if inner
                    .probing_since
                    .is_some_and(|at| at.elapsed() >= self.config.timeout)
                {
                    // Probes that never reported back release their slots.
                    warn!(circuit = %self.name, "Half-open probes unanswered, probing again");
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    inner.half_open_requests = 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Admit a request or fail fast with [`PlatformError::CircuitOpen`].
    ///
    /// # Errors
    ///
    /// Returns `CircuitOpen` while the circuit rejects requests.
    pub fn try_acquire(&self) -> Result<(), PlatformError> {
        if self.allow_request() {
            Ok(())
        } else {
            Err(PlatformError::circuit_open(&self.name))
        }
    }

    /// Record a successful call.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::HalfOpen => {
                inner.successes += 1;
                if inner.successes >= self.config.success_threshold {
                    self.transition(&mut inner, CircuitState::Closed);
                }
            }
            CircuitState::Closed => inner.failures = 0,
            CircuitState::Open => {}
        }
    }

    /// Record a failed call.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.failures += 1;
        match inner.state {
            // A failed probe reopens immediately.
            CircuitState::HalfOpen => self.transition(&mut inner, CircuitState::Open),
            CircuitState::Closed if inner.failures >= self.config.failure_threshold => {
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::Closed | CircuitState::Open => {}
        }
    }

    /// Current circuit state.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        let from = inner.state;
        inner.state = to;
        inner.successes = 0;
        inner.half_open_requests = 0;
        match to {
            CircuitState::Open => {
                inner.opened_at = Some(Instant::now());
                inner.probing_since = None;
                warn!(
                    circuit = %self.name,
                    from_state = from.as_str(),
                    failures = inner.failures,
                    "Circuit breaker opened"
                );
            }
            CircuitState::Closed => {
                inner.failures = 0;
                inner.opened_at = None;
                inner.probing_since = None;
                if from != CircuitState::Closed {
                    info!(circuit = %self.name, from_state = from.as_str(), "Circuit breaker closed");
                }
            }
            CircuitState::HalfOpen => {
                inner.probing_since = Some(Instant::now());
                if from != CircuitState::HalfOpen {
                    info!(circuit = %self.name, "Circuit breaker half-open, probing");
                }
            }
        }
    }
}
