//! Prometheus metrics for profiler-service.
//!
//! Provides HTTP, quiz and AI provider metrics for observability.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Quiz metrics
pub static QUIZZES_STARTED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static SUBMISSIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static ACTIVE_TEST_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

// AI-specific metrics
pub static GENAI_TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static GENAI_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static GENAI_PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static GENAI_PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

fn counter(name: &str, help: &str, labels: &[&str]) -> Result<IntCounterVec, prometheus::Error> {
    IntCounterVec::new(Opts::new(name, help), labels)
}

fn histogram(
    name: &str,
    help: &str,
    buckets: Vec<f64>,
    labels: &[&str],
) -> Result<HistogramVec, prometheus::Error> {
    HistogramVec::new(HistogramOpts::new(name, help).buckets(buckets), labels)
}

fn build() -> Result<(), prometheus::Error> {
    let registry = Registry::new();

    let http_requests = counter(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"],
    )?;
    let http_duration = histogram(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
        &["method", "path"],
    )?;
    let quizzes_started = counter(
        "quizzes_started_total",
        "Quizzes handed out, by number of selected categories",
        &["category_count"],
    )?;
    let submissions = counter(
        "submissions_total",
        "Test submissions by outcome",
        &["outcome"],
    )?;
    let active_sessions = IntGauge::new(
        "active_test_sessions",
        "Test sessions currently held in memory",
    )?;
    let genai_tokens = counter(
        "genai_tokens_total",
        "Total tokens processed",
        &["model", "type"], // type: input, output
    )?;
    let genai_requests = counter(
        "genai_requests_total",
        "Total GenAI requests",
        &["model", "finish_reason"],
    )?;
    let provider_latency = histogram(
        "genai_provider_latency_seconds",
        "AI provider API latency in seconds",
        vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0],
        &["provider", "model"],
    )?;
    let provider_errors = counter(
        "genai_provider_errors_total",
        "Total AI provider errors",
        &["provider", "error_type"],
    )?;

    registry.register(Box::new(http_requests.clone()))?;
    registry.register(Box::new(http_duration.clone()))?;
    registry.register(Box::new(quizzes_started.clone()))?;
    registry.register(Box::new(submissions.clone()))?;
    registry.register(Box::new(active_sessions.clone()))?;
    registry.register(Box::new(genai_tokens.clone()))?;
    registry.register(Box::new(genai_requests.clone()))?;
    registry.register(Box::new(provider_latency.clone()))?;
    registry.register(Box::new(provider_errors.clone()))?;

    // Initialize globals; a second init keeps the first set
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(http_requests);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(http_duration);
    let _ = QUIZZES_STARTED_TOTAL.set(quizzes_started);
    let _ = SUBMISSIONS_TOTAL.set(submissions);
    let _ = ACTIVE_TEST_SESSIONS.set(active_sessions);
    let _ = GENAI_TOKENS_TOTAL.set(genai_tokens);
    let _ = GENAI_REQUESTS_TOTAL.set(genai_requests);
    let _ = GENAI_PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = GENAI_PROVIDER_ERRORS_TOTAL.set(provider_errors);

    Ok(())
}

/// Initialize all metrics. Safe to call more than once.
pub fn init_metrics() {
    if REGISTRY.get().is_some() {
        return;
    }
    match build() {
        Ok(()) => tracing::info!("Prometheus metrics initialized"),
        Err(e) => tracing::error!(error = %e, "Failed to initialize Prometheus metrics"),
    }
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        let status = status.to_string();
        counter
            .with_label_values(&[method, path, status.as_str()])
            .inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }
}

pub fn record_quiz_started(category_count: usize) {
    if let Some(counter) = QUIZZES_STARTED_TOTAL.get() {
        let category_count = category_count.to_string();
        counter
            .with_label_values(&[category_count.as_str()])
            .inc();
    }
}

/// Record a submission outcome (`graded`, `rejected`, `analysis_failed`).
pub fn record_submission(outcome: &str) {
    if let Some(counter) = SUBMISSIONS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn set_active_sessions(count: usize) {
    if let Some(gauge) = ACTIVE_TEST_SESSIONS.get() {
        gauge.set(count as i64);
    }
}

/// Record token usage.
pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    if let Some(counter) = GENAI_TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[model, "input"])
            .inc_by(input_tokens.max(0) as u64);
        counter
            .with_label_values(&[model, "output"])
            .inc_by(output_tokens.max(0) as u64);
    }
}

/// Record a completed GenAI request.
pub fn record_genai_request(model: &str, finish_reason: &str) {
    if let Some(counter) = GENAI_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[model, finish_reason]).inc();
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(histogram) = GENAI_PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(counter) = GENAI_PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}
