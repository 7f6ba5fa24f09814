//! The scan command: connect, scan, print

use anyhow::{Context, Result};
use scanner_lib::{KubeClusterSource, ScanMetrics, Scanner};
use std::path::Path;
use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::output::print_report;

/// Run one scan and print the report
///
/// Nothing is written to stdout unless the scan succeeds.
pub async fn run(config: &ScanConfig, metrics_file: Option<&Path>) -> Result<()> {
    let source =
        KubeClusterSource::connect(config.kubeconfig.as_deref(), config.context.as_deref()).await?;

    let metrics = ScanMetrics::new().context("Failed to initialize scan metrics")?;
    let scanner = Scanner::new(source, config.scan_options()).with_metrics(metrics.clone());

    let result = scanner.scan().await;

    if let Some(path) = metrics_file {
        match write_metrics(&metrics, path) {
            Ok(()) => info!(path = %path.display(), "Wrote scan metrics"),
            Err(err) if result.is_ok() => return Err(err),
            Err(err) => warn!(error = %err, "Failed to write scan metrics"),
        }
    }

    let outcome = result?;
    print_report(&outcome, config.format)
}

/// Write metrics atomically so a textfile collector never reads a partial file
fn write_metrics(metrics: &ScanMetrics, path: &Path) -> Result<()> {
    let text = metrics.encode_text()?;
    let staging = path.with_extension("prom.tmp");

    std::fs::write(&staging, text)
        .with_context(|| format!("Failed to write metrics to {}", staging.display()))?;
    std::fs::rename(&staging, path)
        .with_context(|| format!("Failed to move metrics into {}", path.display()))?;

    Ok(())
}
