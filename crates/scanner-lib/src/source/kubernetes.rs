//! Kubernetes-backed cluster source
//!
//! Lists nodes, pods and events through `kube::Api` and copies the fields the
//! rules need into snapshot models. Credential resolution is left to
//! `kube::Config`.

use std::path::Path;

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::{Event, Node, Pod};
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use super::{async_trait, ClusterSource};
use crate::error::ScanError;
use crate::models::{
    ContainerStatus, EventRecord, NodeCondition, NodeSnapshot, ObjectReference, PodSnapshot,
    ResourceKind,
};

/// Cluster source talking to a live API server
#[derive(Clone)]
pub struct KubeClusterSource {
    client: Client,
}

impl KubeClusterSource {
    /// Wrap an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a source from an explicit kubeconfig and/or context
    ///
    /// With neither set, configuration is inferred the usual way
    /// (`KUBECONFIG`, `~/.kube/config`, then the in-cluster service account).
    pub async fn connect(kubeconfig: Option<&Path>, context: Option<&str>) -> Result<Self> {
        let options = KubeConfigOptions {
            context: context.map(str::to_string),
            ..Default::default()
        };

        let config = match (kubeconfig, context) {
            (Some(path), _) => {
                let kubeconfig = Kubeconfig::read_from(path).with_context(|| {
                    format!("Failed to read kubeconfig from {}", path.display())
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .context("Failed to create Kubernetes config from kubeconfig")?
            }
            (None, Some(_)) => Config::from_kubeconfig(&options)
                .await
                .context("Failed to load Kubernetes config for context")?,
            (None, None) => Config::infer()
                .await
                .context("Failed to infer Kubernetes config")?,
        };

        debug!(cluster_url = %config.cluster_url, "Resolved cluster configuration");

        let client = Client::try_from(config).context("Failed to create Kubernetes client")?;
        Ok(Self::new(client))
    }

    fn scoped_api<K>(&self, namespace: Option<&str>) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }
}

#[async_trait]
impl ClusterSource for KubeClusterSource {
    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>, ScanError> {
        let api: Api<Node> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| classify_kube_error(ResourceKind::Node, e))?;

        Ok(list.items.into_iter().map(node_snapshot).collect())
    }

    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<PodSnapshot>, ScanError> {
        let api: Api<Pod> = self.scoped_api(namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| classify_kube_error(ResourceKind::Pod, e))?;

        Ok(list.items.into_iter().map(pod_snapshot).collect())
    }

    async fn list_events(&self, namespace: Option<&str>) -> Result<Vec<EventRecord>, ScanError> {
        let api: Api<Event> = self.scoped_api(namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| classify_kube_error(ResourceKind::Event, e))?;

        Ok(list.items.into_iter().map(event_record).collect())
    }
}

/// Map a client error onto the scan taxonomy
pub fn classify_kube_error(kind: ResourceKind, err: kube::Error) -> ScanError {
    match &err {
        kube::Error::Api(response) if response.code == 401 || response.code == 403 => {
            ScanError::unauthorized(kind, err)
        }
        kube::Error::Auth(_) => ScanError::unauthorized(kind, err),
        kube::Error::HyperError(_) | kube::Error::Service(_) => ScanError::unreachable(kind, err),
        _ => ScanError::list_failed(kind, err),
    }
}

fn node_snapshot(node: Node) -> NodeSnapshot {
    let conditions = node
        .status
        .and_then(|status| status.conditions)
        .unwrap_or_default()
        .into_iter()
        .map(|c| NodeCondition {
            condition_type: c.type_,
            status: c.status,
            reason: c.reason,
            message: c.message,
            last_transition_time: c.last_transition_time.map(|t| t.0),
        })
        .collect();

    NodeSnapshot {
        name: node.metadata.name,
        conditions,
    }
}

fn pod_snapshot(pod: Pod) -> PodSnapshot {
    let containers = pod
        .status
        .and_then(|status| status.container_statuses)
        .unwrap_or_default()
        .into_iter()
        .map(|c| ContainerStatus {
            name: c.name,
            ready: c.ready,
            restart_count: c.restart_count,
            last_termination_reason: c
                .last_state
                .and_then(|state| state.terminated)
                .and_then(|terminated| terminated.reason),
        })
        .collect();

    PodSnapshot {
        name: pod.metadata.name,
        namespace: pod.metadata.namespace,
        containers,
    }
}

fn event_record(event: Event) -> EventRecord {
    // events.k8s.io producers fill eventTime instead of firstTimestamp
    let first_seen = event
        .first_timestamp
        .map(|t| t.0)
        .or_else(|| event.event_time.map(|t| t.0));

    EventRecord {
        name: event.metadata.name,
        involved_object: ObjectReference {
            kind: event.involved_object.kind,
            namespace: event.involved_object.namespace,
            name: event.involved_object.name,
        },
        reason: event.reason,
        message: event.message,
        event_type: event.type_,
        first_seen,
        count: event.count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use k8s_openapi::api::core::v1::{
        ContainerState, ContainerStateTerminated, ContainerStatus as K8sContainerStatus,
        NodeCondition as K8sNodeCondition, NodeStatus, ObjectReference as K8sObjectReference,
        PodStatus,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{MicroTime, ObjectMeta, Time};
    use kube::core::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "request rejected".to_string(),
            reason: "Rejected".to_string(),
            code,
        })
    }

    #[test]
    fn test_classify_unauthorized() {
        let err = classify_kube_error(ResourceKind::Node, api_error(401));
        assert!(matches!(err, ScanError::Unauthorized { kind: ResourceKind::Node, .. }));

        let err = classify_kube_error(ResourceKind::Pod, api_error(403));
        assert!(matches!(err, ScanError::Unauthorized { kind: ResourceKind::Pod, .. }));
    }

    #[test]
    fn test_classify_server_error_as_list_error() {
        let err = classify_kube_error(ResourceKind::Event, api_error(500));
        assert!(matches!(
            err,
            ScanError::ResourceListError { kind: ResourceKind::Event, .. }
        ));
    }

    #[test]
    fn test_classify_transport_failure_as_unreachable() {
        let err = classify_kube_error(
            ResourceKind::Node,
            kube::Error::Service("connection refused".into()),
        );
        assert!(matches!(err, ScanError::ClusterUnreachable { .. }));
    }

    #[test]
    fn test_classify_decode_failure_as_list_error() {
        let decode = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = classify_kube_error(ResourceKind::Pod, kube::Error::SerdeError(decode));
        assert!(matches!(err, ScanError::ResourceListError { .. }));
    }

    #[test]
    fn test_node_snapshot_copies_conditions_in_order() {
        let transition = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let node = Node {
            metadata: ObjectMeta {
                name: Some("worker-1".to_string()),
                ..Default::default()
            },
            status: Some(NodeStatus {
                conditions: Some(vec![
                    K8sNodeCondition {
                        type_: "MemoryPressure".to_string(),
                        status: "False".to_string(),
                        ..Default::default()
                    },
                    K8sNodeCondition {
                        type_: "Ready".to_string(),
                        status: "False".to_string(),
                        reason: Some("KubeletNotReady".to_string()),
                        last_transition_time: Some(Time(transition)),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let snapshot = node_snapshot(node);
        assert_eq!(snapshot.name.as_deref(), Some("worker-1"));
        assert_eq!(snapshot.conditions.len(), 2);
        assert_eq!(snapshot.conditions[0].condition_type, "MemoryPressure");
        assert_eq!(snapshot.conditions[1].reason.as_deref(), Some("KubeletNotReady"));
        assert_eq!(snapshot.conditions[1].last_transition_time, Some(transition));
    }

    #[test]
    fn test_node_without_status_has_no_conditions() {
        let snapshot = node_snapshot(Node::default());
        assert!(snapshot.name.is_none());
        assert!(snapshot.conditions.is_empty());
    }

    #[test]
    fn test_pod_snapshot_keeps_termination_reason() {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("web-0".to_string()),
                namespace: Some("shop".to_string()),
                ..Default::default()
            },
            status: Some(PodStatus {
                container_statuses: Some(vec![K8sContainerStatus {
                    name: "app".to_string(),
                    ready: false,
                    restart_count: 4,
                    last_state: Some(ContainerState {
                        terminated: Some(ContainerStateTerminated {
                            reason: Some("OOMKilled".to_string()),
                            exit_code: 137,
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let snapshot = pod_snapshot(pod);
        assert_eq!(snapshot.namespace.as_deref(), Some("shop"));
        let container = &snapshot.containers[0];
        assert_eq!(container.name, "app");
        assert!(!container.ready);
        assert_eq!(container.restart_count, 4);
        assert_eq!(container.last_termination_reason.as_deref(), Some("OOMKilled"));
    }

    #[test]
    fn test_event_falls_back_to_event_time() {
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap();
        let event = Event {
            metadata: ObjectMeta {
                name: Some("web-0.17a".to_string()),
                ..Default::default()
            },
            involved_object: K8sObjectReference {
                kind: Some("Pod".to_string()),
                name: Some("web-0".to_string()),
                namespace: Some("shop".to_string()),
                ..Default::default()
            },
            message: Some("Back-off restarting failed container".to_string()),
            type_: Some("Warning".to_string()),
            event_time: Some(MicroTime(at)),
            count: Some(3),
            ..Default::default()
        };

        let record = event_record(event);
        assert_eq!(record.first_seen, Some(at));
        assert_eq!(record.count, Some(3));
        assert_eq!(record.involved_object.kind.as_deref(), Some("Pod"));
        assert!(record.is_warning());
    }
}
