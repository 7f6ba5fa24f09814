//! Scan orchestration
//!
//! A scan lists nodes, pods and events concurrently, waits for all three,
//! runs the rules engine and builds the report. The first failing list
//! aborts the scan and no partial report is produced. An optional deadline
//! covers the whole scan; hitting it drops the in-flight requests.

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::anomaly::{RulesEngine, DEFAULT_EVENT_LIMIT};
use crate::error::ScanError;
use crate::models::{ClusterSnapshot, ResourceKind};
use crate::observability::{ScanMetrics, StructuredLogger};
use crate::report::Report;
use crate::source::ClusterSource;

/// Default deadline for a whole scan
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters for a scan
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Restrict pods and events to one namespace; nodes are always cluster-wide
    pub namespace: Option<String>,
    /// Number of trailing events to report
    pub event_limit: usize,
    /// Deadline for the whole scan, `None` for no deadline
    pub timeout: Option<Duration>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            namespace: None,
            event_limit: DEFAULT_EVENT_LIMIT,
            timeout: Some(DEFAULT_SCAN_TIMEOUT),
        }
    }
}

/// What a scan looked at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub nodes_inspected: usize,
    pub pods_inspected: usize,
    pub events_inspected: usize,
    pub fetched_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// Result of a successful scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub summary: ScanSummary,
    pub report: Report,
}

/// Runs scans against an injected cluster source
pub struct Scanner<S> {
    source: S,
    engine: RulesEngine,
    options: ScanOptions,
    metrics: Option<ScanMetrics>,
    logger: StructuredLogger,
}

impl<S: ClusterSource> Scanner<S> {
    /// Create a scanner with the standard rules
    pub fn new(source: S, options: ScanOptions) -> Self {
        Self {
            source,
            engine: RulesEngine::standard(options.event_limit),
            logger: StructuredLogger::new(options.namespace.as_deref()),
            options,
            metrics: None,
        }
    }

    /// Replace the rules engine
    pub fn with_engine(mut self, engine: RulesEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Record fetch and scan metrics into `metrics`
    pub fn with_metrics(mut self, metrics: ScanMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Fetch the three resource lists concurrently
    pub async fn snapshot(&self) -> Result<ClusterSnapshot, ScanError> {
        let namespace = self.options.namespace.as_deref();

        let (nodes, pods, events) = tokio::try_join!(
            self.timed(ResourceKind::Node, self.source.list_nodes()),
            self.timed(ResourceKind::Pod, self.source.list_pods(namespace)),
            self.timed(ResourceKind::Event, self.source.list_events(namespace)),
        )?;

        Ok(ClusterSnapshot::new(nodes, pods, events))
    }

    /// Run one complete scan under the configured deadline
    pub async fn scan(&self) -> Result<ScanOutcome, ScanError> {
        let started = Instant::now();
        self.logger.log_scan_started(self.options.timeout);

        let result = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(started))
                .await
                .unwrap_or_else(|_| Err(ScanError::ScanTimeout { after: limit })),
            None => self.run(started).await,
        };

        match &result {
            Ok(outcome) => {
                let elapsed = started.elapsed();
                self.logger.log_scan_completed(&outcome.report, elapsed);
                if let Some(metrics) = &self.metrics {
                    metrics.observe_report(&outcome.report, elapsed);
                }
            }
            Err(err) => {
                self.logger.log_scan_failed(err);
                if let Some(metrics) = &self.metrics {
                    metrics.inc_scan_failures(err);
                }
            }
        }

        result
    }

    async fn run(&self, started: Instant) -> Result<ScanOutcome, ScanError> {
        let snapshot = self.snapshot().await?;
        let report = self.engine.evaluate(&snapshot)?;

        for anomaly in report.iter() {
            self.logger.log_anomaly(anomaly);
        }

        Ok(ScanOutcome {
            summary: ScanSummary {
                namespace: self.options.namespace.clone(),
                nodes_inspected: snapshot.nodes.len(),
                pods_inspected: snapshot.pods.len(),
                events_inspected: snapshot.events.len(),
                fetched_at: snapshot.fetched_at,
                elapsed_ms: started.elapsed().as_millis() as u64,
            },
            report,
        })
    }

    async fn timed<T, F>(&self, kind: ResourceKind, fetch: F) -> Result<Vec<T>, ScanError>
    where
        F: Future<Output = Result<Vec<T>, ScanError>>,
    {
        let started = Instant::now();
        let items = fetch.await?;
        let elapsed = started.elapsed();

        self.logger.log_fetch(kind, items.len(), elapsed);
        if let Some(metrics) = &self.metrics {
            metrics.observe_fetch(kind, items.len(), elapsed);
        }

        Ok(items)
    }
}
