//! kube-health CLI
//!
//! Connects to a Kubernetes cluster, takes a point-in-time snapshot of
//! nodes, pods and events, and prints the anomalies it finds.

mod config;
mod output;
mod scan;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::ScanConfig;
use output::OutputFormat;

/// Kubernetes cluster health report
#[derive(Parser)]
#[command(name = "kube-health")]
#[command(author, version, about = "Point-in-time Kubernetes cluster health report", long_about = None)]
pub struct Cli {
    /// Path to kubeconfig file (inferred from KUBECONFIG, ~/.kube/config or the in-cluster service account if not specified)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Restrict pods and events to a namespace (all namespaces if not specified)
    #[arg(long, short)]
    pub namespace: Option<String>,

    /// Number of most recent events to report
    #[arg(long = "events")]
    pub event_limit: Option<usize>,

    /// Scan deadline in seconds, 0 to disable
    #[arg(long = "timeout")]
    pub timeout_secs: Option<u64>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<OutputFormat>,

    /// Configuration file (defaults to ~/.config/kube-health/config.{toml,json,yaml})
    #[arg(long, env = "KUBE_HEALTH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write scan metrics in Prometheus text format to this file
    #[arg(long)]
    pub metrics_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Overlay command-line flags on loaded configuration
    fn apply(&self, mut config: ScanConfig) -> ScanConfig {
        if let Some(path) = &self.kubeconfig {
            config.kubeconfig = Some(path.clone());
        }
        if let Some(context) = &self.context {
            config.context = Some(context.clone());
        }
        if let Some(namespace) = &self.namespace {
            config.namespace = Some(namespace.clone());
        }
        if let Some(limit) = self.event_limit {
            config.event_limit = limit;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        config
    }
}

/// Log filter used when `RUST_LOG` is unset
///
/// Without `--verbose` nothing is logged, so a failed run leaves the
/// diagnostic from `main` as the only line on stderr.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "info,scanner_lib=debug"
    } else {
        "off"
    }
}

/// Logs go to stderr so stdout only ever carries the report
fn init_tracing(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.apply(ScanConfig::load(cli.config.as_deref())?);
    scan::run(&config, cli.metrics_file.as_deref()).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
