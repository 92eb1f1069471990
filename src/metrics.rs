//! Prometheus metrics

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
use prometheus::{self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use strum_macros::Display;
use tracing::Span;

lazy_static! {
    // Registry for holding metric state
    pub static ref REGISTRY: Registry = Registry::new();
    // Simple request counter
    pub static ref INCOMING_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("incoming_requests", "The number of HTTP requests received"),
        &["http_method"]
    ).expect("valid metric");
    // Request counter by status code
    pub static ref RESPONSE_CODE_COLLECTOR: IntCounterVec = IntCounterVec::new(
        Opts::new("outgoing_response", "The number of responses sent."),
        &["status_code"]
    ).expect("valid metric");
    // Request histogram by response time
    pub static ref RESPONSE_TIME_COLLECTOR: HistogramVec = HistogramVec::new(
        HistogramOpts{
            common_opts: Opts::new("response_time", "The time taken to respond to each request"),
            buckets: prometheus::DEFAULT_BUCKETS.to_vec(), // Change buckets here if desired
        },
        &[],
    ).expect("valid metric");
    // Transpose counter by report and outcome
    pub static ref TRANSPOSE_COUNTER: IntCounterVec = IntCounterVec::new(
        Opts::new("transposes", "The number of reports transposed"),
        &["report", "outcome"]
    ).expect("valid metric");
    // Transpose histogram by report, including the source fetch
    pub static ref TRANSPOSE_TIME_COLLECTOR: HistogramVec = HistogramVec::new(
        HistogramOpts{
            common_opts: Opts::new("transpose_time", "The time taken to fetch and transpose each report"),
            buckets: prometheus::DEFAULT_BUCKETS.to_vec(),
        },
        &["report"],
    ).expect("valid metric");
}

/// Outcome of a transpose, used as a metric label.
#[derive(Clone, Copy, Debug, Display, PartialEq)]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

pub fn register_metrics() {
    REGISTRY
        .register(Box::new(INCOMING_REQUESTS.clone()))
        .expect("metric registered once");
    REGISTRY
        .register(Box::new(RESPONSE_CODE_COLLECTOR.clone()))
        .expect("metric registered once");
    REGISTRY
        .register(Box::new(RESPONSE_TIME_COLLECTOR.clone()))
        .expect("metric registered once");
    REGISTRY
        .register(Box::new(TRANSPOSE_COUNTER.clone()))
        .expect("metric registered once");
    REGISTRY
        .register(Box::new(TRANSPOSE_TIME_COLLECTOR.clone()))
        .expect("metric registered once");
}

/// Render all registered metrics in the Prometheus text format.
pub async fn metrics_handler() -> Response {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();

    match encoder.encode(&REGISTRY.gather(), &mut buffer) {
        Ok(()) => (
            [(header::CONTENT_TYPE, encoder.format_type().to_string())],
            buffer,
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", err),
        )
            .into_response(),
    }
}

/// Increments the prometheus counter on all incoming requests, labelled by http method
pub fn request_counter(request: &Request<Body>, _span: &Span) {
    INCOMING_REQUESTS
        .with_label_values(&[&request.method().to_string().to_ascii_uppercase()])
        .inc();
}

/// Increment the prometheus counter on all outgoing responses, labelled by status code
pub fn record_response_metrics<B>(
    response: &Response<B>,
    latency: std::time::Duration,
    _span: &Span,
) {
    RESPONSE_CODE_COLLECTOR
        .with_label_values(&[response.status().as_str()])
        .inc();

    RESPONSE_TIME_COLLECTOR
        .with_label_values(&[])
        .observe(latency.as_secs_f64());
}

/// Record the outcome and duration of transposing a report
pub fn record_transpose(report: &str, outcome: Outcome, duration: std::time::Duration) {
    TRANSPOSE_COUNTER
        .with_label_values(&[report, &outcome.to_string()])
        .inc();

    TRANSPOSE_TIME_COLLECTOR
        .with_label_values(&[report])
        .observe(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_label() {
        assert_eq!("success", Outcome::Success.to_string());
        assert_eq!("failure", Outcome::Failure.to_string());
    }

    #[test]
    fn transpose_counter() {
        let before = TRANSPOSE_COUNTER
            .with_label_values(&["metrics-test", "failure"])
            .get();
        record_transpose(
            "metrics-test",
            Outcome::Failure,
            std::time::Duration::from_millis(5),
        );
        let after = TRANSPOSE_COUNTER
            .with_label_values(&["metrics-test", "failure"])
            .get();
        assert_eq!(before + 1, after);
    }
}
