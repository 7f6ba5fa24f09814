//! Observability infrastructure for scans
//!
//! Provides:
//! - Prometheus metrics for a scan (fetch latency, resources fetched, findings, failures)
//! - Structured logging with tracing

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::anomaly::{Anomaly, Severity};
use crate::error::ScanError;
use crate::models::ResourceKind;
use crate::report::Report;

/// Histogram buckets for list and scan latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Metrics for one process worth of scans
///
/// Metrics live in a private registry so several scanners (and tests) can
/// coexist; callers export them with [`ScanMetrics::encode_text`].
#[derive(Clone)]
pub struct ScanMetrics {
    registry: Registry,
    fetch_duration_seconds: HistogramVec,
    resources_fetched: IntGaugeVec,
    anomalies: IntGaugeVec,
    scan_duration_seconds: Histogram,
    scan_failures: IntCounterVec,
}

impl ScanMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let fetch_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "kube_health_fetch_duration_seconds",
                "Time spent listing one resource kind",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            &["kind"],
        )?;
        let resources_fetched = IntGaugeVec::new(
            Opts::new(
                "kube_health_resources_fetched",
                "Number of resources returned by the last list",
            ),
            &["kind"],
        )?;
        let anomalies = IntGaugeVec::new(
            Opts::new("kube_health_anomalies", "Findings in the last report by kind"),
            &["kind"],
        )?;
        let scan_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("kube_health_scan_duration_seconds", "Wall-clock time of a scan")
                .buckets(LATENCY_BUCKETS.to_vec()),
        )?;
        let scan_failures = IntCounterVec::new(
            Opts::new("kube_health_scan_failures_total", "Scans aborted by error kind"),
            &["error"],
        )?;

        registry.register(Box::new(fetch_duration_seconds.clone()))?;
        registry.register(Box::new(resources_fetched.clone()))?;
        registry.register(Box::new(anomalies.clone()))?;
        registry.register(Box::new(scan_duration_seconds.clone()))?;
        registry.register(Box::new(scan_failures.clone()))?;

        Ok(Self {
            registry,
            fetch_duration_seconds,
            resources_fetched,
            anomalies,
            scan_duration_seconds,
            scan_failures,
        })
    }

    /// Record a completed list call
    pub fn observe_fetch(&self, kind: ResourceKind, count: usize, elapsed: Duration) {
        let label = kind.to_string();
        self.fetch_duration_seconds
            .with_label_values(&[label.as_str()])
            .observe(elapsed.as_secs_f64());
        self.resources_fetched
            .with_label_values(&[label.as_str()])
            .set(count as i64);
    }

    /// Record a finished scan and its per-kind findings
    pub fn observe_report(&self, report: &Report, elapsed: Duration) {
        self.scan_duration_seconds.observe(elapsed.as_secs_f64());
        self.anomalies.reset();
        for (kind, count) in report.counts() {
            self.anomalies
                .with_label_values(&[kind.to_string().as_str()])
                .set(count as i64);
        }
    }

    pub fn inc_scan_failures(&self, err: &ScanError) {
        self.scan_failures
            .with_label_values(&[err.kind_label()])
            .inc();
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn encode_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Structured logger for scan events
///
/// Emits consistently shaped tracing events so log pipelines can key on
/// the `event` field.
#[derive(Clone)]
pub struct StructuredLogger {
    scope: String,
}

impl StructuredLogger {
    /// `namespace` of `None` logs the scope as all namespaces
    pub fn new(namespace: Option<&str>) -> Self {
        Self {
            scope: namespace.unwrap_or("*").to_string(),
        }
    }

    pub fn log_scan_started(&self, timeout: Option<Duration>) {
        info!(
            event = "scan_started",
            scope = %self.scope,
            timeout = ?timeout,
            "Cluster scan started"
        );
    }

    pub fn log_fetch(&self, kind: ResourceKind, count: usize, elapsed: Duration) {
        debug!(
            event = "resources_fetched",
            scope = %self.scope,
            kind = %kind,
            count = count,
            elapsed_ms = elapsed.as_millis() as u64,
            "Listed resources"
        );
    }

    pub fn log_anomaly(&self, anomaly: &Anomaly) {
        match anomaly.severity {
            Severity::Critical => {
                warn!(
                    event = "anomaly_detected",
                    anomaly_kind = %anomaly.kind,
                    resource = %anomaly.resource,
                    container = ?anomaly.container,
                    count = anomaly.count,
                    severity = %anomaly.severity,
                    "Critical anomaly detected"
                );
            }
            _ => {
                debug!(
                    event = "anomaly_detected",
                    anomaly_kind = %anomaly.kind,
                    resource = %anomaly.resource,
                    container = ?anomaly.container,
                    count = anomaly.count,
                    severity = %anomaly.severity,
                    "Anomaly detected"
                );
            }
        }
    }

    pub fn log_scan_completed(&self, report: &Report, elapsed: Duration) {
        info!(
            event = "scan_completed",
            scope = %self.scope,
            anomalies = report.total(),
            groups = report.groups.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Cluster scan completed"
        );
    }

    pub fn log_scan_failed(&self, err: &ScanError) {
        warn!(
            event = "scan_failed",
            scope = %self.scope,
            error_kind = err.kind_label(),
            resource_kind = ?err.resource_kind(),
            error = %err,
            "Cluster scan failed"
        );
    }
}
