//! Cluster snapshot and anomaly scanner
//!
//! This crate provides the core functionality for:
//! - Listing nodes, pods and events from a cluster
//! - Rule-based anomaly detection over the fetched snapshot
//! - Grouped reports decoupled from presentation
//! - Structured logging and scan metrics

pub mod anomaly;
pub mod error;
pub mod models;
pub mod observability;
pub mod report;
pub mod scan;
pub mod source;

pub use anomaly::{Anomaly, AnomalyKind, AnomalyRule, ResourceRef, RulesEngine, Severity};
pub use error::ScanError;
pub use models::*;
pub use observability::{ScanMetrics, StructuredLogger};
pub use report::{AnomalyGroup, Report, ReportBuilder};
pub use scan::{ScanOptions, ScanOutcome, ScanSummary, Scanner};
pub use source::{ClusterSource, KubeClusterSource, StaticClusterSource};
