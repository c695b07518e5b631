//! Prometheus metrics collection for ollama-relay
//!
//! Tracks:
//! - Requests per upstream route
//! - Advisories returned instead of upstream content
//! - Upstream failures by kind
//! - Upstream round-trip latency per route
//! - Frames written to clients
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use crate::error::{Advisory, AppError};
use crate::router::Route;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector for the relay
///
/// All label values come from closed enums ([`Route`], [`Advisory`],
/// [`AppError`]) so cardinality stays fixed.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    advisories_total: IntCounterVec,
    upstream_errors_total: IntCounterVec,
    upstream_duration: HistogramVec,
    frames_emitted: IntCounter,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 5 routes
        let requests_total = IntCounterVec::new(
            Opts::new(
                "ollama_relay_requests_total",
                "Total number of relayed requests by upstream route",
            ),
            &["route"],
        )?;

        let advisories_total = IntCounterVec::new(
            Opts::new(
                "ollama_relay_advisories_total",
                "Requests answered with an advisory frame instead of upstream content",
            ),
            &["kind"],
        )?;

        let upstream_errors_total = IntCounterVec::new(
            Opts::new(
                "ollama_relay_upstream_errors_total",
                "Upstream failures surfaced to clients as HTTP errors",
            ),
            &["kind"],
        )?;

        let upstream_duration = HistogramVec::new(
            HistogramOpts::new(
                "ollama_relay_upstream_duration_ms",
                "Upstream round-trip latency in milliseconds",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0, 60000.0,
            ]),
            &["route"],
        )?;

        let frames_emitted = IntCounter::with_opts(Opts::new(
            "ollama_relay_frames_emitted_total",
            "Total NDJSON frames written to clients",
        ))?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(advisories_total.clone()))?;
        registry.register(Box::new(upstream_errors_total.clone()))?;
        registry.register(Box::new(upstream_duration.clone()))?;
        registry.register(Box::new(frames_emitted.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            advisories_total,
            upstream_errors_total,
            upstream_duration,
            frames_emitted,
        })
    }

    /// Count a request that was planned onto `route`
    pub fn record_request(&self, route: Route) {
        self.requests_total.with_label_values(&[route.as_str()]).inc();
    }

    /// Count an advisory sent in place of upstream content
    pub fn record_advisory(&self, advisory: &Advisory) {
        self.advisories_total
            .with_label_values(&[advisory.kind()])
            .inc();
    }

    /// Count an upstream failure that became an HTTP error
    pub fn record_upstream_error(&self, error: &AppError) {
        self.upstream_errors_total
            .with_label_values(&[error.kind()])
            .inc();
    }

    /// Record upstream round-trip latency
    ///
    /// # Errors
    ///
    /// Returns an error if `duration_ms` is NaN, infinite, or negative. Such
    /// values would corrupt every percentile of the histogram.
    pub fn record_upstream_duration(
        &self,
        route: Route,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite and non-negative, got: {}",
                duration_ms
            )));
        }

        self.upstream_duration
            .get_metric_with_label_values(&[route.as_str()])?
            .observe(duration_ms);
        Ok(())
    }

    pub fn record_frames(&self, count: usize) {
        self.frames_emitted.inc_by(count as u64);
    }

    /// Gather all metrics in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Metrics output is not valid UTF-8: {}", e))
        })
    }
}
