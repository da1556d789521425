//! Prometheus-backed metrics registry.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Label values are bounded: routes come from matched paths, outcomes from
//!   error kinds.

use std::convert::TryFrom;
use std::sync::Arc;
use std::time::Duration;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    conversions_total: IntCounterVec,
    tool_last_duration_ms: IntGauge,
    workspace_cleanup_failures_total: IntCounter,
}

/// Point-in-time view of the scalar collectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Duration of the most recent tool run, in milliseconds.
    pub tool_last_duration_ms: i64,
    /// Workspaces whose removal failed.
    pub workspace_cleanup_failures_total: u64,
}

fn collector<T>(name: &'static str, built: prometheus::Result<T>) -> Result<T> {
    built.map_err(|source| TelemetryError::MetricsCollector { name, source })
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = collector(
            "http_requests_total",
            IntCounterVec::new(
                Opts::new("http_requests_total", "Total HTTP requests received"),
                &["route", "code"],
            ),
        )?;
        let conversions_total = collector(
            "conversions_total",
            IntCounterVec::new(
                Opts::new("conversions_total", "Conversion requests by mode and outcome"),
                &["input", "output", "outcome"],
            ),
        )?;
        let tool_last_duration_ms = collector(
            "tool_last_duration_ms",
            IntGauge::with_opts(Opts::new(
                "tool_last_duration_ms",
                "Wall-clock time of the most recent extraction tool run (ms)",
            )),
        )?;
        let workspace_cleanup_failures_total = collector(
            "workspace_cleanup_failures_total",
            IntCounter::with_opts(Opts::new(
                "workspace_cleanup_failures_total",
                "Request workspaces that could not be removed",
            )),
        )?;

        let register = |name: &'static str, collector: Box<dyn prometheus::core::Collector>| {
            registry
                .register(collector)
                .map_err(|source| TelemetryError::MetricsRegister { name, source })
        };
        register("http_requests_total", Box::new(http_requests_total.clone()))?;
        register("conversions_total", Box::new(conversions_total.clone()))?;
        register(
            "tool_last_duration_ms",
            Box::new(tool_last_duration_ms.clone()),
        )?;
        register(
            "workspace_cleanup_failures_total",
            Box::new(workspace_cleanup_failures_total.clone()),
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                conversions_total,
                tool_last_duration_ms,
                workspace_cleanup_failures_total,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Count one finished conversion; `outcome` is `ok` or an error kind.
    pub fn inc_conversion(&self, input: &str, output: &str, outcome: &str) {
        self.inner
            .conversions_total
            .with_label_values(&[input, output, outcome])
            .inc();
    }

    /// Number of conversions recorded with the given labels.
    #[must_use]
    pub fn conversion_count(&self, input: &str, output: &str, outcome: &str) -> u64 {
        self.inner
            .conversions_total
            .with_label_values(&[input, output, outcome])
            .get()
    }

    /// Record the duration of the latest tool run.
    pub fn observe_tool_duration(&self, duration: Duration) {
        self.inner
            .tool_last_duration_ms
            .set(Self::duration_to_ms(duration));
    }

    /// Increment the workspace cleanup failure counter.
    pub fn inc_workspace_cleanup_failure(&self) {
        self.inner.workspace_cleanup_failures_total.inc();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the scalar collectors.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tool_last_duration_ms: self.inner.tool_last_duration_ms.get(),
            workspace_cleanup_failures_total: self.inner.workspace_cleanup_failures_total.get(),
        }
    }

    /// Convert a duration to milliseconds saturating at `i64::MAX`.
    fn duration_to_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }
}
