//! Report assembly
//!
//! Groups findings by kind without filtering or re-ranking them. Groups
//! appear in the order their first finding was produced, and findings keep
//! their production order inside a group.

use serde::{Deserialize, Serialize};

use crate::anomaly::{Anomaly, AnomalyKind, Severity};

/// Findings of one kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyGroup {
    pub kind: AnomalyKind,
    pub anomalies: Vec<Anomaly>,
}

impl AnomalyGroup {
    pub fn len(&self) -> usize {
        self.anomalies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }
}

/// Grouped findings of one scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub groups: Vec<AnomalyGroup>,
}

impl Report {
    /// Findings of a kind, empty if none were produced
    pub fn anomalies(&self, kind: AnomalyKind) -> &[Anomaly] {
        self.groups
            .iter()
            .find(|g| g.kind == kind)
            .map(|g| g.anomalies.as_slice())
            .unwrap_or(&[])
    }

    /// Number of findings of a kind
    pub fn count(&self, kind: AnomalyKind) -> usize {
        self.anomalies(kind).len()
    }

    /// Per-kind counts in group order
    pub fn counts(&self) -> Vec<(AnomalyKind, usize)> {
        self.groups.iter().map(|g| (g.kind, g.len())).collect()
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(AnomalyGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Highest severity present, if any
    pub fn worst_severity(&self) -> Option<Severity> {
        self.groups
            .iter()
            .flat_map(|g| g.anomalies.iter())
            .map(|a| a.severity)
            .max()
    }

    /// All findings, group by group
    pub fn iter(&self) -> impl Iterator<Item = &Anomaly> {
        self.groups.iter().flat_map(|g| g.anomalies.iter())
    }
}

/// Builds reports from flat finding lists
pub struct ReportBuilder;

impl ReportBuilder {
    pub fn build(anomalies: impl IntoIterator<Item = Anomaly>) -> Report {
        let mut groups: Vec<AnomalyGroup> = Vec::new();

        for anomaly in anomalies {
            match groups.iter_mut().find(|g| g.kind == anomaly.kind) {
                Some(group) => group.anomalies.push(anomaly),
                None => groups.push(AnomalyGroup {
                    kind: anomaly.kind,
                    anomalies: vec![anomaly],
                }),
            }
        }

        Report { groups }
    }
}
