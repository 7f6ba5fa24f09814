//! Rule registry and evaluation

use super::events::{RecentEventsRule, DEFAULT_EVENT_LIMIT};
use super::finding::Anomaly;
use super::node_readiness::NodeReadinessRule;
use super::pod_readiness::PodReadinessRule;
use super::restarts::ContainerRestartRule;
use crate::error::ScanError;
use crate::models::ClusterSnapshot;
use crate::report::{Report, ReportBuilder};

/// A pure check over a cluster snapshot
///
/// Rules must not panic on well-formed input and must report malformed
/// entities as `ScanError::MalformedSnapshot` instead of skipping them.
pub trait AnomalyRule: Send + Sync {
    /// Stable identifier used in logs
    fn name(&self) -> &'static str;

    /// Produce findings in encounter order
    fn evaluate(&self, snapshot: &ClusterSnapshot) -> Result<Vec<Anomaly>, ScanError>;
}

/// Ordered set of rules evaluated against a snapshot
pub struct RulesEngine {
    rules: Vec<Box<dyn AnomalyRule>>,
}

impl RulesEngine {
    /// Engine with no rules registered
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Engine with the standard rules, reporting up to `event_limit` events
    pub fn standard(event_limit: usize) -> Self {
        Self::empty()
            .with_rule(NodeReadinessRule::new())
            .with_rule(PodReadinessRule::new())
            .with_rule(ContainerRestartRule::new())
            .with_rule(RecentEventsRule::new(event_limit))
    }

    /// Register a rule after the existing ones
    pub fn with_rule(mut self, rule: impl AnomalyRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule in registration order and concatenate the findings
    pub fn detect(&self, snapshot: &ClusterSnapshot) -> Result<Vec<Anomaly>, ScanError> {
        let mut anomalies = Vec::new();
        for rule in &self.rules {
            let found = rule.evaluate(snapshot)?;
            tracing::trace!(rule = rule.name(), found = found.len(), "Rule evaluated");
            anomalies.extend(found);
        }
        Ok(anomalies)
    }

    /// Run every rule and group the findings into a report
    pub fn evaluate(&self, snapshot: &ClusterSnapshot) -> Result<Report, ScanError> {
        Ok(ReportBuilder::build(self.detect(snapshot)?))
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::standard(DEFAULT_EVENT_LIMIT)
    }
}
