//! Output formatting for scan reports

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use scanner_lib::{Anomaly, AnomalyGroup, AnomalyKind, ResourceRef, ScanOutcome, Severity};
use serde::{Deserialize, Serialize};
use tabled::{settings::Style, Table, Tabled};

/// Output format for the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per anomaly, grouped by kind (default)
    #[default]
    Text,
    /// One table per anomaly kind
    Table,
    /// JSON document with summary and report
    Json,
}

/// Row for anomaly tables
#[derive(Tabled)]
struct AnomalyRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "Count")]
    count: u32,
    #[tabled(rename = "Observed")]
    observed: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

/// Print the outcome of a scan to stdout
pub fn print_report(outcome: &ScanOutcome, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => render_text(outcome),
        OutputFormat::Table => render_table(outcome),
        OutputFormat::Json => serde_json::to_string_pretty(outcome)?,
    };
    println!("{}", rendered);
    Ok(())
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Render the report as grouped lines
pub fn render_text(outcome: &ScanOutcome) -> String {
    let mut lines = Vec::new();

    if outcome.report.is_empty() {
        lines.push(format!("{} No anomalies found", "✓".green().bold()));
    }

    for group in &outcome.report.groups {
        lines.push(group_heading(group));
        for anomaly in &group.anomalies {
            lines.push(format!("  {} {}", severity_marker(anomaly.severity), anomaly_line(anomaly)));
        }
    }

    lines.push(String::new());
    lines.push(summary_line(outcome));
    lines.join("\n")
}

/// Render the report as one table per group
pub fn render_table(outcome: &ScanOutcome) -> String {
    let mut sections = Vec::new();

    if outcome.report.is_empty() {
        sections.push(format!("{} No anomalies found", "✓".green().bold()));
    }

    for group in &outcome.report.groups {
        let rows: Vec<AnomalyRow> = group
            .anomalies
            .iter()
            .map(|a| AnomalyRow {
                severity: color_severity(a.severity),
                resource: qualified_name(&a.resource),
                container: a.container.clone().unwrap_or_else(|| "-".to_string()),
                count: a.count,
                observed: format_timestamp(a),
                detail: a.detail.clone(),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        sections.push(format!("{}\n{}", group_heading(group), table));
    }

    sections.push(summary_line(outcome));
    sections.join("\n\n")
}

/// One line describing a single anomaly
pub fn anomaly_line(anomaly: &Anomaly) -> String {
    let name = qualified_name(&anomaly.resource);
    match anomaly.kind {
        AnomalyKind::NodeNotReady => format!(
            "Node {} is not ready: {} conditions are not ready",
            name, anomaly.count
        ),
        AnomalyKind::PodNotReady => format!("Pod {} is not ready: {}", name, anomaly.detail),
        AnomalyKind::ContainerRestarted => format!(
            "Pod {} was restarted {} times: {}",
            name, anomaly.count, anomaly.detail
        ),
        AnomalyKind::NotableEvent => format!(
            "{} {} {}: {}",
            format_timestamp(anomaly),
            anomaly.resource.kind,
            name,
            anomaly.detail
        ),
    }
}

fn group_heading(group: &AnomalyGroup) -> String {
    format!("{} ({})", group.kind.title(), group.len())
        .bold()
        .to_string()
}

fn summary_line(outcome: &ScanOutcome) -> String {
    let summary = &outcome.summary;
    let scope = match &summary.namespace {
        Some(ns) => format!(" in namespace {}", ns),
        None => String::new(),
    };
    format!(
        "Scanned {} nodes, {} pods, {} events{} in {}ms: {} anomalies",
        summary.nodes_inspected,
        summary.pods_inspected,
        summary.events_inspected,
        scope,
        summary.elapsed_ms,
        outcome.report.total()
    )
}

/// `namespace/name` for namespaced resources, `name` otherwise
fn qualified_name(resource: &ResourceRef) -> String {
    match &resource.namespace {
        Some(ns) => format!("{}/{}", ns, resource.name),
        None => resource.name.clone(),
    }
}

fn severity_marker(severity: Severity) -> String {
    match severity {
        Severity::Critical => "✗".red().bold().to_string(),
        Severity::Warning => "⚠".yellow().bold().to_string(),
        Severity::Info => "ℹ".blue().bold().to_string(),
    }
}

/// Color severity based on value
fn color_severity(severity: Severity) -> String {
    let label = severity.to_string();
    match severity {
        Severity::Critical => label.red().to_string(),
        Severity::Warning => label.yellow().to_string(),
        Severity::Info => label.blue().to_string(),
    }
}

/// Format observation time for display
fn format_timestamp(anomaly: &Anomaly) -> String {
    anomaly
        .observed_at
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}
