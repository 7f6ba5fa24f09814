//! Recent event selection
//!
//! Takes the last N entries of the event list exactly as the API returned
//! it. The list is not sorted, so "recent" means "last in API order", which
//! is usually but not necessarily chronological.

use super::engine::AnomalyRule;
use super::finding::{describe, Anomaly, AnomalyKind, ResourceRef, Severity};
use crate::error::ScanError;
use crate::models::{ClusterSnapshot, EventRecord, ResourceKind};

/// Default number of trailing events to report
pub const DEFAULT_EVENT_LIMIT: usize = 5;

/// Reports the trailing events of the list
#[derive(Debug, Clone, Copy)]
pub struct RecentEventsRule {
    /// Maximum number of events to select
    pub limit: usize,
}

impl RecentEventsRule {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// The trailing `limit` events in list order; all of them if fewer
    pub fn select<'a>(&self, events: &'a [EventRecord]) -> &'a [EventRecord] {
        let start = events.len().saturating_sub(self.limit);
        &events[start..]
    }

    /// Turn a single event into a finding
    pub fn check(&self, event: &EventRecord) -> Result<Anomaly, ScanError> {
        self.check_at(None, event)
    }

    fn check_at(&self, position: Option<usize>, event: &EventRecord) -> Result<Anomaly, ScanError> {
        let handle = || describe(event.name.as_deref(), position);

        let involved = event.involved_object.name.as_deref().ok_or_else(|| {
            ScanError::malformed(ResourceKind::Event, handle(), "event has no involved object name")
        })?;
        let count = match event.count {
            None => 1,
            Some(count) if count >= 0 => count as u32,
            Some(count) => {
                return Err(ScanError::malformed(
                    ResourceKind::Event,
                    handle(),
                    format!("event reports negative count {count}"),
                ))
            }
        };

        // message is optional on core/v1 events
        let message = event.message.as_deref().unwrap_or_default();
        let detail = match event.reason.as_deref() {
            Some(reason) if message.is_empty() => reason.to_string(),
            Some(reason) => format!("{reason}: {message}"),
            None => message.to_string(),
        };

        Ok(Anomaly {
            source: ResourceKind::Event,
            resource: ResourceRef {
                kind: event
                    .involved_object
                    .kind
                    .clone()
                    .unwrap_or_else(|| "Object".to_string()),
                namespace: event.involved_object.namespace.clone(),
                name: involved.to_string(),
            },
            kind: AnomalyKind::NotableEvent,
            container: None,
            count,
            severity: if event.is_warning() {
                Severity::Warning
            } else {
                Severity::Info
            },
            detail,
            observed_at: event.first_seen,
        })
    }
}

impl Default for RecentEventsRule {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LIMIT)
    }
}

impl AnomalyRule for RecentEventsRule {
    fn name(&self) -> &'static str {
        "recent_events"
    }

    fn evaluate(&self, snapshot: &ClusterSnapshot) -> Result<Vec<Anomaly>, ScanError> {
        let selected = self.select(&snapshot.events);
        let offset = snapshot.events.len() - selected.len();

        selected
            .iter()
            .enumerate()
            .map(|(i, event)| self.check_at(Some(offset + i), event))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObjectReference;

    fn event(index: usize) -> EventRecord {
        EventRecord {
            name: Some(format!("event-{index}")),
            involved_object: ObjectReference {
                kind: Some("Pod".to_string()),
                namespace: Some("default".to_string()),
                name: Some(format!("pod-{index}")),
            },
            reason: None,
            message: Some(format!("message {index}")),
            event_type: Some("Normal".to_string()),
            first_seen: None,
            count: None,
        }
    }

    fn events(n: usize) -> Vec<EventRecord> {
        (0..n).map(event).collect()
    }

    #[test]
    fn test_selects_last_five_in_order() {
        let list = events(7);
        let selected = RecentEventsRule::default().select(&list);
        assert_eq!(selected.len(), 5);
        assert_eq!(selected, &list[2..7]);
    }

    #[test]
    fn test_short_list_selects_everything() {
        let list = events(3);
        let selected = RecentEventsRule::default().select(&list);
        assert_eq!(selected, &list[..]);

        assert!(RecentEventsRule::default().select(&[]).is_empty());
    }

    #[test]
    fn test_zero_limit_selects_nothing() {
        let list = events(4);
        assert!(RecentEventsRule::new(0).select(&list).is_empty());
    }

    #[test]
    fn test_evaluate_preserves_api_order() {
        let snapshot = ClusterSnapshot::new(vec![], vec![], events(7));
        let anomalies = RecentEventsRule::default().evaluate(&snapshot).unwrap();

        let names: Vec<_> = anomalies.iter().map(|a| a.resource.name.as_str()).collect();
        assert_eq!(names, vec!["pod-2", "pod-3", "pod-4", "pod-5", "pod-6"]);
        assert!(anomalies.iter().all(|a| a.count == 1));
        assert!(anomalies.iter().all(|a| a.severity == Severity::Info));
    }

    #[test]
    fn test_warning_event_with_reason() {
        let mut record = event(0);
        record.event_type = Some("Warning".to_string());
        record.reason = Some("BackOff".to_string());
        record.count = Some(14);

        let anomaly = RecentEventsRule::default().check(&record).unwrap();
        assert_eq!(anomaly.severity, Severity::Warning);
        assert_eq!(anomaly.count, 14);
        assert_eq!(anomaly.detail, "BackOff: message 0");
        assert_eq!(anomaly.resource.kind, "Pod");
    }

    #[test]
    fn test_missing_message_reports_reason_only() {
        let mut record = event(0);
        record.message = None;
        record.reason = Some("Scheduled".to_string());

        let anomaly = RecentEventsRule::default().check(&record).unwrap();
        assert_eq!(anomaly.detail, "Scheduled");
        assert_eq!(anomaly.resource.name, "pod-0");

        record.reason = None;
        let anomaly = RecentEventsRule::default().check(&record).unwrap();
        assert_eq!(anomaly.detail, "");
    }

    #[test]
    fn test_missing_message_does_not_fail_scan() {
        let mut list = events(6);
        list[4].message = None;
        let snapshot = ClusterSnapshot::new(vec![], vec![], list);

        let anomalies = RecentEventsRule::default().evaluate(&snapshot).unwrap();
        assert_eq!(anomalies.len(), 5);
        assert_eq!(anomalies[3].resource.name, "pod-4");
    }

    #[test]
    fn test_missing_involved_object_is_malformed() {
        let mut list = events(6);
        list[4].involved_object.name = None;
        let snapshot = ClusterSnapshot::new(vec![], vec![], list);

        let err = RecentEventsRule::default().evaluate(&snapshot).unwrap_err();
        assert!(matches!(err, ScanError::MalformedSnapshot { kind: ResourceKind::Event, .. }));
        assert!(err.to_string().contains("event-4"));
    }

    #[test]
    fn test_negative_count_is_malformed() {
        let mut record = event(0);
        record.count = Some(-2);
        let err = RecentEventsRule::default().check(&record).unwrap_err();
        assert!(err.to_string().contains("negative count -2"));
    }

    #[test]
    fn test_unselected_events_are_not_validated() {
        let mut list = events(6);
        list[0].involved_object.name = None;
        let snapshot = ClusterSnapshot::new(vec![], vec![], list);

        assert_eq!(RecentEventsRule::default().evaluate(&snapshot).unwrap().len(), 5);
    }
}
