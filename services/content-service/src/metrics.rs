//! Prometheus metrics exposition and in-process counters
//!
//! Service-level series:
//!
//! - `content_requests_total` (counter): labels `kind`, `status`
//! - `content_generation_duration_seconds` (histogram): label `kind`
//! - `content_generation_attempts_total` (counter): label `outcome`
//!
//! Key pool series (`gemini_key_*`, `gemini_pool_resets_total`,
//! `gemini_active_key_slot`) are emitted by the pool crate through the same
//! global recorder.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Instant;

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Generation latency buckets: 100ms up to the longest sane multi-attempt call.
const DURATION_BUCKETS: &[f64] = &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0];

fn builder() -> PrometheusBuilder {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("content_generation_duration_seconds".to_string()),
            DURATION_BUCKETS,
        )
        .expect("failed to set histogram buckets")
}

/// Install the global Prometheus recorder and return a handle for `/metrics`.
pub fn install_recorder() -> PrometheusHandle {
    builder()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Record a finished generation request.
pub fn record_request(kind: &'static str, status: u16, duration_secs: f64) {
    metrics::counter!("content_requests_total", "kind" => kind, "status" => status.to_string())
        .increment(1);
    metrics::histogram!("content_generation_duration_seconds", "kind" => kind)
        .record(duration_secs);
}

/// Record one outbound Gemini attempt. `outcome` is `success`, a failure
/// class label, or `unusable`.
pub fn record_attempt(outcome: &'static str) {
    metrics::counter!("content_generation_attempts_total", "outcome" => outcome).increment(1);
}

/// Counters surfaced on `/health`.
#[derive(Debug, Clone)]
pub struct ServiceMetrics {
    pub requests_total: Arc<AtomicU64>,
    pub errors_total: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests_total: Arc::new(AtomicU64::new(0)),
            errors_total: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }
}
