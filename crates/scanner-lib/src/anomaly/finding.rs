//! Anomaly records produced by the rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::models::ResourceKind;

/// Classification of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyKind {
    NodeNotReady,
    PodNotReady,
    ContainerRestarted,
    NotableEvent,
}

impl AnomalyKind {
    /// Heading used when presenting a group of this kind
    pub fn title(&self) -> &'static str {
        match self {
            AnomalyKind::NodeNotReady => "Nodes not ready",
            AnomalyKind::PodNotReady => "Pods not ready",
            AnomalyKind::ContainerRestarted => "Restarted containers",
            AnomalyKind::NotableEvent => "Recent events",
        }
    }
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyKind::NodeNotReady => write!(f, "NodeNotReady"),
            AnomalyKind::PodNotReady => write!(f, "PodNotReady"),
            AnomalyKind::ContainerRestarted => write!(f, "ContainerRestarted"),
            AnomalyKind::NotableEvent => write!(f, "NotableEvent"),
        }
    }
}

/// Severity levels for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Identity of the resource a finding is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    /// API kind, e.g. `Node`, `Pod`, or an event's involved object kind
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceRef {
    pub fn node(name: impl Into<String>) -> Self {
        Self {
            kind: "Node".to_string(),
            namespace: None,
            name: name.into(),
        }
    }

    pub fn pod(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: "Pod".to_string(),
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.kind.to_lowercase(), ns, self.name),
            None => write!(f, "{}/{}", self.kind.to_lowercase(), self.name),
        }
    }
}

/// A single finding derived from a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Which resource list the finding came from
    pub source: ResourceKind,
    pub resource: ResourceRef,
    pub kind: AnomalyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    /// Unready-condition tally, restart count, or event occurrence count
    pub count: u32,
    pub severity: Severity,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

/// Human-readable handle for an entity that may lack a name
pub(crate) fn describe(name: Option<&str>, position: Option<usize>) -> String {
    match (name, position) {
        (Some(name), _) => name.to_string(),
        (None, Some(position)) => format!("at position {position}"),
        (None, None) => "<unnamed>".to_string(),
    }
}

/// Validate a pod's identity and container statuses
pub(crate) fn pod_identity(
    pod: &crate::models::PodSnapshot,
    position: Option<usize>,
) -> Result<(String, String), ScanError> {
    let handle = || describe(pod.name.as_deref(), position);

    let name = pod
        .name
        .clone()
        .ok_or_else(|| ScanError::malformed(ResourceKind::Pod, handle(), "pod has no name"))?;
    let namespace = pod
        .namespace
        .clone()
        .ok_or_else(|| ScanError::malformed(ResourceKind::Pod, handle(), "pod has no namespace"))?;

    for container in &pod.containers {
        if container.name.is_empty() {
            return Err(ScanError::malformed(
                ResourceKind::Pod,
                format!("{namespace}/{name}"),
                "container status has no name",
            ));
        }
        if container.restart_count < 0 {
            return Err(ScanError::malformed(
                ResourceKind::Pod,
                format!("{namespace}/{name}"),
                format!(
                    "container {} reports negative restart count {}",
                    container.name, container.restart_count
                ),
            ));
        }
    }

    Ok((namespace, name))
}
