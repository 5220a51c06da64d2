//! Error taxonomy for resolution and reconciliation.

use ember_config::{ConversionError, MergeError, SerializationError};
use ember_store::{FragmentKey, StoreError};

/// A resolution attempt failed. All variants are terminal for the attempt;
/// no partial result is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A fragment was reached twice within one resolution, via any mix of
    /// replace chains and merge trees.
    #[error("cycle detected at {0}")]
    CycleDetected(FragmentKey),

    /// A replace target (or a selector match) vanished mid-resolution.
    #[error("referenced fragment not found: {0}")]
    ReferenceNotFound(FragmentKey),

    /// A visited fragment's own content failed conversion.
    #[error("conversion of {key} failed: {source}")]
    ConversionFailed {
        key: FragmentKey,
        #[source]
        source: ConversionError,
    },

    /// The merger reported an incompatibility while folding.
    #[error("merge under {key} failed: {source}")]
    MergeFailed {
        key: FragmentKey,
        #[source]
        source: MergeError,
    },

    /// The store failed while traversing the graph.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A reconcile invocation failed and should be retried by the invoking
/// runtime.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Graph resolution failed.
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// A status or artifact write failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The merged config could not be encoded.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl ReconcileError {
    /// Whether retrying the invocation from scratch can make progress.
    ///
    /// Optimistic-concurrency conflicts always can; the recompute is
    /// idempotent.
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Conflict { .. })
                | Self::Resolve(ResolveError::Store(StoreError::Conflict { .. }))
        )
    }
}
