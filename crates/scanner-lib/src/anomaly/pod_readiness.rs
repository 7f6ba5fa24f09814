//! Pod container readiness detection
//!
//! Emits one finding per container that is not ready, so a pod with two
//! failing containers produces two findings.

use super::engine::AnomalyRule;
use super::finding::{pod_identity, Anomaly, AnomalyKind, ResourceRef, Severity};
use crate::error::ScanError;
use crate::models::{ClusterSnapshot, PodSnapshot, ResourceKind};

/// Detects containers that are not ready
#[derive(Debug, Clone, Copy, Default)]
pub struct PodReadinessRule;

impl PodReadinessRule {
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
            .filter(|c| !c.ready)
            .map(|c| Anomaly {
                source: ResourceKind::Pod,
                resource: ResourceRef::pod(namespace.clone(), name.clone()),
                kind: AnomalyKind::PodNotReady,
                container: Some(c.name.clone()),
                // validated non-negative by pod_identity
                count: c.restart_count as u32,
                severity: Severity::Warning,
                detail: format!(
                    "container {} is not ready (restart count {})",
                    c.name, c.restart_count
                ),
                observed_at: None,
            })
            .collect())
    }
}

impl AnomalyRule for PodReadinessRule {
    fn name(&self) -> &'static str {
        "pod_container_readiness"
    }

    fn evaluate(&self, snapshot: &ClusterSnapshot) -> Result<Vec<Anomaly>, ScanError> {
        let mut anomalies = Vec::new();
        for (position, pod) in snapshot.pods.iter().enumerate() {
            anomalies.extend(self.check_at(Some(position), pod)?);
        }
        Ok(anomalies)
    }
}
