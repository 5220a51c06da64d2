//! The store accessor boundary.

use crate::artifact::DerivedArtifact;
use crate::fragment::Fragment;
use crate::selector::LabelSelector;
use async_trait::async_trait;

/// Errors surfaced at the store boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A write was conditioned on a stale resource version. Always safe
    /// to retry the whole invocation from scratch.
    #[error("conflicting write on {key}: expected version {expected}, found {found}")]
    Conflict {
        key: String,
        expected: u64,
        found: u64,
    },

    /// The object addressed by a write no longer exists.
    #[error("object not found: {0}")]
    NotFound(String),

    /// An update tried to clear or change a write-once field.
    #[error("field {field} of {key} is immutable once set")]
    ImmutableField { key: String, field: &'static str },
}

/// Read/list/write access to fragments and their derived artifacts.
///
/// All writes are conditional on the `resource_version` the caller last
/// observed; a mismatch yields [`StoreError::Conflict`] and the caller is
/// expected to restart its invocation. Implementations must be safe to
/// share across concurrently reconciled fragment identities.
#[async_trait]
pub trait FragmentStore: Send + Sync {
    /// Fetch one fragment, `None` when absent.
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Fragment>, StoreError>;

    /// List fragments in a namespace matching the selector. Listing order
    /// is not guaranteed stable; callers needing determinism must sort.
    async fn list(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<Fragment>, StoreError>;

    /// Persist metadata and spec. Status is untouched. Enforces
    /// target-artifact immutability. Returns the stored object with its
    /// new resource version.
    async fn update(&self, fragment: &Fragment) -> Result<Fragment, StoreError>;

    /// Persist status only. Returns the stored object with its new
    /// resource version.
    async fn patch_status(&self, fragment: &Fragment) -> Result<Fragment, StoreError>;

    /// Fetch a derived artifact, `None` when absent.
    async fn get_artifact(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DerivedArtifact>, StoreError>;

    /// Create the artifact, or overwrite an existing one conditioned on
    /// its resource version.
    async fn create_or_update_artifact(
        &self,
        artifact: &DerivedArtifact,
    ) -> Result<DerivedArtifact, StoreError>;
}
