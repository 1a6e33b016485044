//! Prometheus metrics for the session service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, CounterVec, HistogramVec,
    IntCounter,
};

/// Store primitive calls by operation and outcome.
pub static STORE_OPERATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "session_service_store_operations_total",
        "Total number of session store operations",
        &["operation", "status"]
    )
    .expect("Failed to register store_operations metric")
});

/// Validations where the token was live but the TTL reset failed.
pub static REFRESH_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "session_service_refresh_failures_total",
        "Total number of failed TTL resets on live tokens"
    )
    .expect("Failed to register refresh_failures metric")
});

/// RPC outcomes by method and error code.
pub static RPC_REQUESTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "session_service_rpc_requests_total",
        "Total number of session RPCs",
        &["method", "code"]
    )
    .expect("Failed to register rpc_requests metric")
});

/// gRPC method latency histogram.
pub static GRPC_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "session_service_grpc_latency_seconds",
        "gRPC method latency in seconds",
        &["method"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register grpc_latency metric")
});

/// Record an RPC outcome.
pub fn record_rpc(method: &str, code: &str, elapsed_secs: f64) {
    RPC_REQUESTS.with_label_values(&[method, code]).inc();
    GRPC_LATENCY
        .with_label_values(&[method])
        .observe(elapsed_secs);
}
