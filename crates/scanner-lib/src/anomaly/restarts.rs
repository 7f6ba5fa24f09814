//! Container restart detection
//!
//! Independent of readiness: a container that is ready now but restarted
//! earlier is still reported.

use super::engine::AnomalyRule;
use super::finding::{pod_identity, Anomaly, AnomalyKind, ResourceRef, Severity};
use crate::error::ScanError;
use crate::models::{ClusterSnapshot, PodSnapshot, ResourceKind};

/// Restart count at which a finding is escalated to critical
const CRITICAL_RESTART_COUNT: i32 = 10;

/// Detects containers with a non-zero restart count
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerRestartRule;

impl ContainerRestartRule {
    pub fn new() -> Self {
        Self
    }

    /// Check every container status of a single pod
    pub fn check(&self, pod: &PodSnapshot) -> Result<Vec<Anomaly>, ScanError> {
        self.check_at(None, pod)
    }

    fn check_at(&self, position: Option<usize>, pod: &PodSnapshot) -> Result<Vec<Anomaly>, ScanError> {
        let (namespace, name) = pod_identity(pod, position)?;

        Ok(pod
            .containers
            .iter()
            .filter(|c| c.restart_count > 0)
            .map(|c| {
                let mut detail = format!("container {} restarted {} time(s)", c.name, c.restart_count);
                if let Some(reason) = &c.last_termination_reason {
                    detail.push_str(&format!(", last terminated: {reason}"));
                }

                Anomaly {
                    source: ResourceKind::Pod,
                    resource: ResourceRef::pod(namespace.clone(), name.clone()),
                    kind: AnomalyKind::ContainerRestarted,
                    container: Some(c.name.clone()),
                    count: c.restart_count as u32,
                    severity: if c.restart_count >= CRITICAL_RESTART_COUNT {
                        Severity::Critical
                    } else {
                        Severity::Warning
                    },
                    detail,
                    observed_at: None,
                }
            })
            .collect())
    }
}

impl AnomalyRule for ContainerRestartRule {
    fn name(&self) -> &'static str {
        "pod_container_restarts"
    }

    fn evaluate(&self, snapshot: &ClusterSnapshot) -> Result<Vec<Anomaly>, ScanError> {
        let mut anomalies = Vec::new();
        for (position, pod) in snapshot.pods.iter().enumerate() {
            anomalies.extend(self.check_at(Some(position), pod)?);
        }
        Ok(anomalies)
    }
}
