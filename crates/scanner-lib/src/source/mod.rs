//! Cluster client adapter
//!
//! This module provides:
//! - The `ClusterSource` capability the scanner depends on
//! - A Kubernetes implementation backed by `kube::Api`
//! - An in-memory implementation for tests and offline snapshots

mod kubernetes;
mod static_source;

pub use kubernetes::{classify_kube_error, KubeClusterSource};
pub use static_source::{InjectedFailure, StaticClusterSource};

use crate::error::ScanError;
use crate::models::{EventRecord, NodeSnapshot, PodSnapshot};

pub use async_trait::async_trait;

/// Read-only list operations against a cluster control plane
///
/// Each call issues one list request and returns the complete list the API
/// handed back. `None` namespace means all namespaces. Implementations do not
/// retry.
#[async_trait]
pub trait ClusterSource: Send + Sync {
    /// List all nodes (cluster-scoped)
    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>, ScanError>;

    /// List pods in a namespace, or across all namespaces
    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<PodSnapshot>, ScanError>;

    /// List events in a namespace, or across all namespaces, in API order
    async fn list_events(&self, namespace: Option<&str>) -> Result<Vec<EventRecord>, ScanError>;
}
