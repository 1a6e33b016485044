//! Edge observability: Prometheus metrics for decisions and the session
//! circuit.

pub mod metrics;

pub use metrics::EdgeMetrics;
