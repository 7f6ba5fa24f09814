//! Integration tests for full scans through the public API

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scanner_lib::source::InjectedFailure;
use scanner_lib::{
    AnomalyKind, ClusterSnapshot, ClusterSource, ContainerStatus, EventRecord, NodeCondition,
    NodeSnapshot, ObjectReference, PodSnapshot, ResourceKind, ScanError, ScanOptions, Scanner,
    StaticClusterSource,
};
use tokio_test::{assert_err, assert_ok};

/// Source that records the namespace each list was scoped to
#[derive(Default, Clone)]
struct RecordingSource {
    calls: Arc<Mutex<Vec<(ResourceKind, Option<String>)>>>,
}

impl RecordingSource {
    fn record(&self, kind: ResourceKind, namespace: Option<&str>) {
        self.calls
            .lock()
            .unwrap()
            .push((kind, namespace.map(str::to_string)));
    }
}

#[async_trait]
impl ClusterSource for RecordingSource {
    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>, ScanError> {
        self.record(ResourceKind::Node, None);
        Ok(vec![])
    }

    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<PodSnapshot>, ScanError> {
        self.record(ResourceKind::Pod, namespace);
        Ok(vec![])
    }

    async fn list_events(&self, namespace: Option<&str>) -> Result<Vec<EventRecord>, ScanError> {
        self.record(ResourceKind::Event, namespace);
        Ok(vec![])
    }
}

fn event(index: usize, event_type: &str) -> EventRecord {
    EventRecord {
        name: Some(format!("evt-{index}")),
        involved_object: ObjectReference {
            kind: Some("Pod".to_string()),
            namespace: Some("payments".to_string()),
            name: Some(format!("checkout-{index}")),
        },
        reason: Some("Pulled".to_string()),
        message: Some(format!("step {index}")),
        event_type: Some(event_type.to_string()),
        first_seen: None,
        count: Some(1),
    }
}

fn busy_cluster() -> StaticClusterSource {
    StaticClusterSource::new()
        .with_nodes(vec![
            NodeSnapshot {
                name: Some("cp-1".to_string()),
                conditions: vec![NodeCondition::new("Ready", "True")],
            },
            NodeSnapshot {
                name: Some("worker-1".to_string()),
                conditions: vec![
                    NodeCondition::new("DiskPressure", "False"),
                    NodeCondition::new("Ready", "Unknown"),
                ],
            },
        ])
        .with_pods(vec![
            PodSnapshot {
                name: Some("checkout-0".to_string()),
                namespace: Some("payments".to_string()),
                containers: vec![
                    ContainerStatus::new("app", true, 0),
                    ContainerStatus::new("envoy", false, 2),
                ],
            },
            PodSnapshot {
                name: Some("coredns-1".to_string()),
                namespace: Some("kube-system".to_string()),
                containers: vec![ContainerStatus::new("coredns", true, 1)],
            },
        ])
        .with_events((0..7).map(|i| event(i, if i % 2 == 0 { "Normal" } else { "Warning" })).collect())
}

#[tokio::test]
async fn test_full_scan_groups_in_rule_order() {
    let scanner = Scanner::new(busy_cluster(), ScanOptions::default());
    let outcome = assert_ok!(scanner.scan().await);

    let kinds: Vec<_> = outcome.report.groups.iter().map(|g| g.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AnomalyKind::NodeNotReady,
            AnomalyKind::PodNotReady,
            AnomalyKind::ContainerRestarted,
            AnomalyKind::NotableEvent,
        ]
    );

    assert_eq!(outcome.report.count(AnomalyKind::NodeNotReady), 1);
    assert_eq!(outcome.report.count(AnomalyKind::PodNotReady), 1);
    assert_eq!(outcome.report.count(AnomalyKind::ContainerRestarted), 2);
    assert_eq!(outcome.report.count(AnomalyKind::NotableEvent), 5);
    assert_eq!(outcome.report.total(), 9);
}

#[tokio::test]
async fn test_namespace_scoping_reaches_source() {
    let source = RecordingSource::default();
    let options = ScanOptions {
        namespace: Some("payments".to_string()),
        ..Default::default()
    };
    let scanner = Scanner::new(source.clone(), options);
    assert_ok!(scanner.scan().await);

    let mut calls = source.calls.lock().unwrap().clone();
    calls.sort_by_key(|(kind, _)| format!("{kind}"));
    assert_eq!(
        calls,
        vec![
            (ResourceKind::Event, Some("payments".to_string())),
            (ResourceKind::Node, None),
            (ResourceKind::Pod, Some("payments".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_namespace_scoping_with_static_source() {
    let options = ScanOptions {
        namespace: Some("kube-system".to_string()),
        ..Default::default()
    };
    let outcome = assert_ok!(Scanner::new(busy_cluster(), options).scan().await);

    assert_eq!(outcome.summary.pods_inspected, 1);
    assert_eq!(outcome.summary.events_inspected, 0);
    assert_eq!(outcome.summary.namespace.as_deref(), Some("kube-system"));
}

#[tokio::test]
async fn test_custom_event_limit() {
    let options = ScanOptions {
        event_limit: 2,
        ..Default::default()
    };
    let outcome = assert_ok!(Scanner::new(busy_cluster(), options).scan().await);

    let events = outcome.report.anomalies(AnomalyKind::NotableEvent);
    let names: Vec<_> = events.iter().map(|a| a.resource.name.as_str()).collect();
    assert_eq!(names, vec!["checkout-5", "checkout-6"]);
}

#[tokio::test]
async fn test_unauthorized_pods_abort_scan() {
    let scanner = Scanner::new(
        busy_cluster().failing(ResourceKind::Pod, InjectedFailure::Unauthorized),
        ScanOptions::default(),
    );

    let err = assert_err!(scanner.scan().await);
    assert_eq!(err.kind_label(), "unauthorized");
    assert_eq!(err.resource_kind(), Some(ResourceKind::Pod));
}

#[tokio::test]
async fn test_list_error_surfaces_kind() {
    let scanner = Scanner::new(
        busy_cluster().failing(ResourceKind::Event, InjectedFailure::ListError),
        ScanOptions::default(),
    );

    let err = assert_err!(scanner.scan().await);
    assert!(err.to_string().starts_with("failed to list events"));
}

#[tokio::test]
async fn test_no_deadline_waits_for_slow_source() {
    let options = ScanOptions {
        timeout: None,
        ..Default::default()
    };
    let scanner = Scanner::new(busy_cluster().with_delay(Duration::from_millis(30)), options);
    assert_ok!(scanner.scan().await);
}

#[tokio::test]
async fn test_saved_snapshot_rescans_identically() {
    let scanner = Scanner::new(busy_cluster(), ScanOptions::default());
    let snapshot = assert_ok!(scanner.snapshot().await);

    let json = serde_json::to_string(&snapshot).unwrap();
    let restored: ClusterSnapshot = serde_json::from_str(&json).unwrap();

    let first = assert_ok!(scanner.scan().await);
    let second = assert_ok!(
        Scanner::new(StaticClusterSource::from_snapshot(restored), ScanOptions::default())
            .scan()
            .await
    );
    assert_eq!(first.report, second.report);
}
