//! In-memory cluster source
//!
//! Serves fixed lists, optionally failing or stalling one resource kind.
//! Useful for tests and for re-scanning a snapshot saved as JSON.

use std::time::Duration;

use super::{async_trait, ClusterSource};
use crate::error::ScanError;
use crate::models::{ClusterSnapshot, EventRecord, NodeSnapshot, PodSnapshot, ResourceKind};

/// Failure injected for one resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    Unreachable,
    Unauthorized,
    ListError,
}

/// Cluster source backed by fixed lists
#[derive(Debug, Clone, Default)]
pub struct StaticClusterSource {
    nodes: Vec<NodeSnapshot>,
    pods: Vec<PodSnapshot>,
    events: Vec<EventRecord>,
    failure: Option<(ResourceKind, InjectedFailure)>,
    delay: Option<Duration>,
}

impl StaticClusterSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve the lists of a previously captured snapshot
    pub fn from_snapshot(snapshot: ClusterSnapshot) -> Self {
        Self {
            nodes: snapshot.nodes,
            pods: snapshot.pods,
            events: snapshot.events,
            ..Default::default()
        }
    }

    pub fn with_nodes(mut self, nodes: Vec<NodeSnapshot>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn with_pods(mut self, pods: Vec<PodSnapshot>) -> Self {
        self.pods = pods;
        self
    }

    pub fn with_events(mut self, events: Vec<EventRecord>) -> Self {
        self.events = events;
        self
    }

    /// Make every list of `kind` fail
    pub fn failing(mut self, kind: ResourceKind, failure: InjectedFailure) -> Self {
        self.failure = Some((kind, failure));
        self
    }

    /// Sleep before answering every list call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn answer<T: Clone>(&self, kind: ResourceKind, items: &[T]) -> Result<Vec<T>, ScanError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.failure {
            Some((failing, failure)) if failing == kind => Err(match failure {
                InjectedFailure::Unreachable => ScanError::unreachable(kind, "connection refused"),
                InjectedFailure::Unauthorized => ScanError::unauthorized(kind, "token expired"),
                InjectedFailure::ListError => ScanError::list_failed(kind, "internal server error"),
            }),
            _ => Ok(items.to_vec()),
        }
    }
}

#[async_trait]
impl ClusterSource for StaticClusterSource {
    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>, ScanError> {
        self.answer(ResourceKind::Node, &self.nodes).await
    }

    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<PodSnapshot>, ScanError> {
        let pods = self.answer(ResourceKind::Pod, &self.pods).await?;
        Ok(match namespace {
            Some(ns) => pods
                .into_iter()
                .filter(|p| p.namespace.as_deref() == Some(ns))
                .collect(),
            None => pods,
        })
    }

    async fn list_events(&self, namespace: Option<&str>) -> Result<Vec<EventRecord>, ScanError> {
        let events = self.answer(ResourceKind::Event, &self.events).await?;
        Ok(match namespace {
            Some(ns) => events
                .into_iter()
                .filter(|e| e.involved_object.namespace.as_deref() == Some(ns))
                .collect(),
            None => events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContainerStatus;

    fn pod(name: &str, namespace: &str) -> PodSnapshot {
        PodSnapshot {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            containers: vec![ContainerStatus::new("app", true, 0)],
        }
    }

    #[tokio::test]
    async fn test_namespace_filter() {
        let source = StaticClusterSource::new().with_pods(vec![pod("a", "one"), pod("b", "two")]);

        let all = source.list_pods(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let scoped = source.list_pods(Some("two")).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].name.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_injected_failure_only_hits_its_kind() {
        let source = StaticClusterSource::new()
            .with_pods(vec![pod("a", "one")])
            .failing(ResourceKind::Event, InjectedFailure::Unauthorized);

        assert!(source.list_pods(None).await.is_ok());
        let err = source.list_events(None).await.unwrap_err();
        assert!(matches!(
            err,
            ScanError::Unauthorized { kind: ResourceKind::Event, .. }
        ));
    }
}
