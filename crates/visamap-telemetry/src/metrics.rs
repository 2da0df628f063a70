//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the counters and gauges relevant to policy mutations and publishing.

use std::sync::Arc;

use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    policy_mutations_total: IntCounterVec,
    publish_total: IntCounterVec,
    auth_failures_total: IntCounter,
    published_origins: IntGauge,
    published_entries: IntGauge,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Origins written by the most recent publish.
    pub published_origins: i64,
    /// Entries written by the most recent publish.
    pub published_entries: i64,
    /// Rejected admin credentials since start.
    pub auth_failures_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests received"),
            &["route", "code"],
        )
        .map_err(|source| collector_error("http_requests_total", source))?;
        let policy_mutations_total = IntCounterVec::new(
            Opts::new(
                "policy_mutations_total",
                "Policy upserts and deletes by outcome",
            ),
            &["operation", "outcome"],
        )
        .map_err(|source| collector_error("policy_mutations_total", source))?;
        let publish_total = IntCounterVec::new(
            Opts::new("publish_total", "Artifact publish attempts by outcome"),
            &["outcome"],
        )
        .map_err(|source| collector_error("publish_total", source))?;
        let auth_failures_total = IntCounter::with_opts(Opts::new(
            "auth_failures_total",
            "Admin credential checks that failed",
        ))
        .map_err(|source| collector_error("auth_failures_total", source))?;
        let published_origins = IntGauge::with_opts(Opts::new(
            "published_origins",
            "Distinct origins in the last published artifacts",
        ))
        .map_err(|source| collector_error("published_origins", source))?;
        let published_entries = IntGauge::with_opts(Opts::new(
            "published_entries",
            "Entries in the last published artifacts",
        ))
        .map_err(|source| collector_error("published_entries", source))?;

        register(&registry, "http_requests_total", &http_requests_total)?;
        register(&registry, "policy_mutations_total", &policy_mutations_total)?;
        register(&registry, "publish_total", &publish_total)?;
        register(&registry, "auth_failures_total", &auth_failures_total)?;
        register(&registry, "published_origins", &published_origins)?;
        register(&registry, "published_entries", &published_entries)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                policy_mutations_total,
                publish_total,
                auth_failures_total,
                published_origins,
                published_entries,
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

    /// Count an upsert or delete attempt with its outcome label.
    pub fn inc_policy_mutation(&self, operation: &str, outcome: &str) {
        self.inner
            .policy_mutations_total
            .with_label_values(&[operation, outcome])
            .inc();
    }

    /// Count a publish attempt with its outcome label.
    pub fn inc_publish(&self, outcome: &str) {
        self.inner.publish_total.with_label_values(&[outcome]).inc();
    }

    /// Increment the failed credential counter.
    pub fn inc_auth_failure(&self) {
        self.inner.auth_failures_total.inc();
    }

    /// Record the size of the most recent publish.
    pub fn set_published(&self, origins: usize, entries: usize) {
        self.inner
            .published_origins
            .set(i64::try_from(origins).unwrap_or(i64::MAX));
        self.inner
            .published_entries
            .set(i64::try_from(entries).unwrap_or(i64::MAX));
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

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            published_origins: self.inner.published_origins.get(),
            published_entries: self.inner.published_entries.get(),
            auth_failures_total: self.inner.auth_failures_total.get(),
        }
    }
}

const fn collector_error(name: &'static str, source: prometheus::Error) -> TelemetryError {
    TelemetryError::MetricsCollector { name, source }
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}
