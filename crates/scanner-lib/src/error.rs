//! Error taxonomy for scans

use std::time::Duration;

use crate::models::ResourceKind;

/// Boxed underlying cause of an adapter failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by a scan
///
/// Adapter errors carry the resource kind being listed and the underlying
/// cause so the failure can be diagnosed without re-querying the cluster.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("cluster unreachable while listing {kind}")]
    ClusterUnreachable {
        kind: ResourceKind,
        #[source]
        source: BoxError,
    },

    #[error("unauthorized to list {kind}")]
    Unauthorized {
        kind: ResourceKind,
        #[source]
        source: BoxError,
    },

    #[error("failed to list {kind}")]
    ResourceListError {
        kind: ResourceKind,
        #[source]
        source: BoxError,
    },

    #[error("malformed {kind} snapshot {resource}: {reason}")]
    MalformedSnapshot {
        kind: ResourceKind,
        resource: String,
        reason: String,
    },

    #[error("scan timed out after {after:?}")]
    ScanTimeout { after: Duration },
}

impl ScanError {
    pub fn unreachable(kind: ResourceKind, source: impl Into<BoxError>) -> Self {
        Self::ClusterUnreachable {
            kind,
            source: source.into(),
        }
    }

    pub fn unauthorized(kind: ResourceKind, source: impl Into<BoxError>) -> Self {
        Self::Unauthorized {
            kind,
            source: source.into(),
        }
    }

    pub fn list_failed(kind: ResourceKind, source: impl Into<BoxError>) -> Self {
        Self::ResourceListError {
            kind,
            source: source.into(),
        }
    }

    pub fn malformed(
        kind: ResourceKind,
        resource: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedSnapshot {
            kind,
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Stable label used in logs and metrics
    pub fn kind_label(&self) -> &'static str {
        match self {
            ScanError::ClusterUnreachable { .. } => "cluster_unreachable",
            ScanError::Unauthorized { .. } => "unauthorized",
            ScanError::ResourceListError { .. } => "resource_list_error",
            ScanError::MalformedSnapshot { .. } => "malformed_snapshot",
            ScanError::ScanTimeout { .. } => "scan_timeout",
        }
    }

    /// Resource kind involved, if the error is tied to one
    pub fn resource_kind(&self) -> Option<ResourceKind> {
        match self {
            ScanError::ClusterUnreachable { kind, .. }
            | ScanError::Unauthorized { kind, .. }
            | ScanError::ResourceListError { kind, .. }
            | ScanError::MalformedSnapshot { kind, .. } => Some(*kind),
            ScanError::ScanTimeout { .. } => None,
        }
    }
}
