//! Core data models for cluster snapshots
//!
//! Snapshots are plain copies of what the control plane returned at fetch
//! time. Fields the Kubernetes API treats as optional stay optional here;
//! the rules engine decides whether an entity is usable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition type that carries node readiness
pub const READY_CONDITION: &str = "Ready";

/// Condition status that means the condition holds
pub const CONDITION_TRUE: &str = "True";

/// Event type reported for abnormal occurrences
pub const WARNING_EVENT_TYPE: &str = "Warning";

/// Kind of resource list an entity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Node,
    Pod,
    Event,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Node => write!(f, "nodes"),
            ResourceKind::Pod => write!(f, "pods"),
            ResourceKind::Event => write!(f, "events"),
        }
    }
}

/// Node as seen at fetch time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: Option<String>,
    /// Conditions in the order the API reported them
    pub conditions: Vec<NodeCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCondition {
    pub condition_type: String,
    pub status: String,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl NodeCondition {
    /// Create a condition with only type and status set
    pub fn new(condition_type: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            condition_type: condition_type.into(),
            status: status.into(),
            reason: None,
            message: None,
            last_transition_time: None,
        }
    }

    /// True for a `Ready` condition whose status is anything but `True`
    pub fn is_unready(&self) -> bool {
        self.condition_type == READY_CONDITION && self.status != CONDITION_TRUE
    }
}

/// Pod as seen at fetch time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodSnapshot {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub containers: Vec<ContainerStatus>,
}

/// Status of one container inside a pod
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
    /// Signed because that is how the API encodes it; negative values are malformed
    pub restart_count: i32,
    pub last_termination_reason: Option<String>,
}

impl ContainerStatus {
    pub fn new(name: impl Into<String>, ready: bool, restart_count: i32) -> Self {
        Self {
            name: name.into(),
            ready,
            restart_count,
            last_termination_reason: None,
        }
    }
}

/// Reference to the object an event is about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectReference {
    pub kind: Option<String>,
    pub namespace: Option<String>,
    pub name: Option<String>,
}

/// Cluster event as returned by the events list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// The event object's own name
    pub name: Option<String>,
    pub involved_object: ObjectReference,
    pub reason: Option<String>,
    pub message: Option<String>,
    /// `Normal` or `Warning`
    pub event_type: Option<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub count: Option<i32>,
}

impl EventRecord {
    pub fn is_warning(&self) -> bool {
        self.event_type.as_deref() == Some(WARNING_EVENT_TYPE)
    }
}

/// The three resource lists fetched by one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub pods: Vec<PodSnapshot>,
    /// Events in API order, never re-sorted
    pub events: Vec<EventRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl ClusterSnapshot {
    pub fn new(nodes: Vec<NodeSnapshot>, pods: Vec<PodSnapshot>, events: Vec<EventRecord>) -> Self {
        Self {
            nodes,
            pods,
            events,
            fetched_at: Utc::now(),
        }
    }
}
