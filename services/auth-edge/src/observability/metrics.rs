//! Decision and Circuit Breaker Metrics

use crate::decision::AuthorizationDecision;
use prometheus::{CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry};
use rust_common::CircuitState;

/// Metrics for the `Check` path.
#[derive(Clone)]
pub struct EdgeMetrics {
    /// Decisions by outcome and reason
    pub decisions: CounterVec,
    /// Check latency by outcome
    pub check_latency: HistogramVec,
    /// In-flight checks
    pub active_checks: Gauge,
    /// Current circuit state (0=closed, 1=open, 2=half-open)
    pub circuit_state: GaugeVec,
}

impl EdgeMetrics {
    /// Creates and registers the metrics.
    ///
    /// # Errors
    ///
    /// Registration conflicts in `registry`.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let decisions = CounterVec::new(
            Opts::new("decisions_total", "Total authorization decisions").namespace("auth_edge"),
            &["decision", "reason"],
        )?;
        registry.register(Box::new(decisions.clone()))?;

        let check_latency = HistogramVec::new(
            HistogramOpts::new("check_latency_seconds", "Check latency in seconds")
                .namespace("auth_edge")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 3.0]),
            &["decision"],
        )?;
        registry.register(Box::new(check_latency.clone()))?;

        let active_checks = Gauge::with_opts(
            Opts::new("active_checks", "Number of in-flight checks").namespace("auth_edge"),
        )?;
        registry.register(Box::new(active_checks.clone()))?;

        let circuit_state = GaugeVec::new(
            Opts::new("circuit_breaker_state", "Current circuit breaker state")
                .namespace("auth_edge"),
            &["circuit"],
        )?;
        registry.register(Box::new(circuit_state.clone()))?;

        Ok(Self {
            decisions,
            check_latency,
            active_checks,
            circuit_state,
        })
    }

    /// Records a finished check.
    pub fn record_decision(&self, decision: AuthorizationDecision, reason: &str, latency_secs: f64) {
        self.decisions
            .with_label_values(&[decision.as_str(), reason])
            .inc();
        self.check_latency
            .with_label_values(&[decision.as_str()])
            .observe(latency_secs);
    }

    /// Records the current state of a circuit.
    pub fn record_circuit_state(&self, circuit: &str, state: CircuitState) {
        let value = match state {
            CircuitState::Closed => 0.0,
            CircuitState::Open => 1.0,
            CircuitState::HalfOpen => 2.0,
        };
        self.circuit_state.with_label_values(&[circuit]).set(value);
    }
}
