//! Prometheus metrics registered in the default registry
//!
//! Exposed through `GET /metrics`.

use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

lazy_static! {
    /// Handled requests by operation (fetch, merge, custom_info) and outcome
    pub static ref REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "ocular_requests_total",
        "Requests handled, by operation and outcome",
        &["operation", "outcome"]
    )
    .unwrap();

    /// Latency of individual store round trips
    pub static ref STORE_OP_SECONDS: HistogramVec = register_histogram_vec!(
        "ocular_store_op_seconds",
        "Store operation latency in seconds",
        &["operation"]
    )
    .unwrap();
}

/// Count one handled request
pub fn record_request(operation: &str, outcome: &str) {
    REQUESTS_TOTAL.with_label_values(&[operation, outcome]).inc();
}
