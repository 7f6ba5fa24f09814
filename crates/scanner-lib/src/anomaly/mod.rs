//! Anomaly rules over cluster snapshots
//!
//! This module provides detection for:
//! - Nodes whose Ready condition is not True
//! - Containers that are not ready
//! - Containers that have restarted
//! - The trailing events of the event list

mod engine;
mod events;
mod finding;
mod node_readiness;
mod pod_readiness;
mod restarts;

pub use engine::{AnomalyRule, RulesEngine};
pub use events::{RecentEventsRule, DEFAULT_EVENT_LIMIT};
pub use finding::{Anomaly, AnomalyKind, ResourceRef, Severity};
pub use node_readiness::NodeReadinessRule;
pub use pod_readiness::PodReadinessRule;
pub use restarts::ContainerRestartRule;
