//! Configuration management for the CLI
//!
//! Values are layered, lowest precedence first: built-in defaults, the
//! config file, `KUBE_HEALTH_*` environment variables, command-line flags.

use anyhow::{Context, Result};
use scanner_lib::anomaly::DEFAULT_EVENT_LIMIT;
use scanner_lib::ScanOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::output::OutputFormat;

/// Prefix for environment overrides, e.g. `KUBE_HEALTH_NAMESPACE`
const ENV_PREFIX: &str = "KUBE_HEALTH";

/// Scan configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Path to kubeconfig file; inferred when unset
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[serde(default)]
    pub context: Option<String>,

    /// Namespace for pods and events; all namespaces when unset
    #[serde(default)]
    pub namespace: Option<String>,

    /// Number of trailing events to report
    #[serde(default = "default_event_limit")]
    pub event_limit: usize,

    /// Scan deadline in seconds, 0 for none
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_event_limit() -> usize {
    DEFAULT_EVENT_LIMIT
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            context: None,
            namespace: None,
            event_limit: default_event_limit(),
            timeout_secs: default_timeout_secs(),
            format: OutputFormat::default(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with_env(explicit, config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Load with a specific environment source layered over the file
    pub(crate) fn load_with_env(
        explicit: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self> {
        let mut builder = config::Config::builder();

        match explicit {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(path) = Self::default_path() {
                    builder = builder.add_source(config::File::from(path).required(false));
                }
            }
        }

        builder
            .add_source(environment)
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Scan options derived from this configuration
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            namespace: self.namespace.clone(),
            event_limit: self.event_limit,
            timeout: match self.timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    /// Default config file stem; any supported extension is accepted
    fn default_path() -> Option<PathBuf> {
        let home = dirs_next::home_dir()?;
        Some(home.join(".config").join("kube-health").join("config"))
    }
}
