//! Node readiness detection
//!
//! Flags nodes whose `Ready` condition reports anything other than `True`.
//! A node that reports no `Ready` condition at all is left alone: missing
//! information is not treated as a failure.

use super::engine::AnomalyRule;
use super::finding::{describe, Anomaly, AnomalyKind, ResourceRef, Severity};
use crate::error::ScanError;
use crate::models::{ClusterSnapshot, NodeSnapshot, ResourceKind};

/// Detects nodes that are not ready
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeReadinessRule;

impl NodeReadinessRule {
    pub fn new() -> Self {
        Self
    }

    /// Check a single node
    ///
    /// # Returns
    /// * `Ok(Some(Anomaly))` carrying the number of non-`True` Ready conditions
    /// * `Ok(None)` if the node is ready or reports no Ready condition
    /// * `Err(MalformedSnapshot)` if the node has no name
    pub fn check(&self, node: &NodeSnapshot) -> Result<Option<Anomaly>, ScanError> {
        self.check_at(None, node)
    }

    fn check_at(
        &self,
        position: Option<usize>,
        node: &NodeSnapshot,
    ) -> Result<Option<Anomaly>, ScanError> {
        let name = node.name.as_deref().ok_or_else(|| {
            ScanError::malformed(
                ResourceKind::Node,
                describe(None, position),
                "node has no name",
            )
        })?;

        let unready: Vec<_> = node.conditions.iter().filter(|c| c.is_unready()).collect();
        let Some(first) = unready.first() else {
            return Ok(None);
        };

        let count = unready.len() as u32;
        let mut detail = format!("{count} Ready condition(s) not True (status {})", first.status);
        if let Some(reason) = &first.reason {
            detail.push_str(&format!(", reason {reason}"));
        }
        if let Some(message) = &first.message {
            detail.push_str(&format!(": {message}"));
        }

        Ok(Some(Anomaly {
            source: ResourceKind::Node,
            resource: ResourceRef::node(name),
            kind: AnomalyKind::NodeNotReady,
            container: None,
            count,
            severity: Severity::Critical,
            detail,
            observed_at: first.last_transition_time,
        }))
    }
}

impl AnomalyRule for NodeReadinessRule {
    fn name(&self) -> &'static str {
        "node_readiness"
    }

    fn evaluate(&self, snapshot: &ClusterSnapshot) -> Result<Vec<Anomaly>, ScanError> {
        let mut anomalies = Vec::new();
        for (position, node) in snapshot.nodes.iter().enumerate() {
            if let Some(anomaly) = self.check_at(Some(position), node)? {
                anomalies.push(anomaly);
            }
        }
        Ok(anomalies)
    }
}
