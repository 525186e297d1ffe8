//! Prometheus metrics for content-service.
//!
//! Exposes interaction and purchase collectors plus an HTTP handler for the
//! `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Interaction writes by action (like, unlike, comment, comment_delete, ...).
    pub static ref CONTENT_INTERACTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "content_interactions_total",
        "Content interaction writes segmented by action",
        &["action"]
    )
    .expect("failed to register content_interactions_total");

    /// View increments that failed and were swallowed.
    pub static ref VIEW_INCREMENT_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "content_view_increment_failures_total",
        "View counter increments that failed"
    )
    .expect("failed to register content_view_increment_failures_total");

    /// Purchase recording attempts by outcome (recorded, conflict, rejected, error).
    pub static ref PURCHASE_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "content_purchase_attempts_total",
        "Purchase recording attempts segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register content_purchase_attempts_total");

    /// HTTP request latency by matched route.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "content_http_request_duration_seconds",
        "HTTP request duration segmented by method, route and status",
        &["method", "route", "status"]
    )
    .expect("failed to register content_http_request_duration_seconds");
}

pub fn record_interaction(action: &str) {
    CONTENT_INTERACTIONS_TOTAL
        .with_label_values(&[action])
        .inc();
}

pub fn record_purchase_attempt(outcome: &str) {
    PURCHASE_ATTEMPTS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
