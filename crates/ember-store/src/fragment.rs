//! Fragment object model.

use crate::condition::Condition;
use crate::selector::LabelSelector;
use chrono::{DateTime, Utc};
use ember_config::BootConfigContent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Namespace+name identity of a fragment.
///
/// This is also the key used for cycle detection during resolution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FragmentKey {
    pub namespace: String,
    pub name: String,
}

impl FragmentKey {
    #[inline]
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Object metadata shared by fragments and derived artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub namespace: String,
    pub name: String,

    /// Opaque stable identity assigned by the store at creation.
    pub uid: Uuid,

    /// Version token for optimistic concurrency. Every accepted write
    /// bumps it; a write conditioned on a stale value is rejected.
    pub resource_version: u64,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalizers: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerReference>,
}

/// Link from a derived artifact to its owning fragment.
///
/// The store garbage-collects owned objects when the owner is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReference {
    pub name: String,
    pub uid: Uuid,
}

/// A unit of declarative boot configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Fragment {
    pub metadata: ObjectMeta,
    pub spec: FragmentSpec,
    #[serde(default)]
    pub status: FragmentStatus,
}

impl Fragment {
    /// Namespace+name identity.
    #[inline]
    #[must_use]
    pub fn key(&self) -> FragmentKey {
        FragmentKey::new(self.metadata.namespace.clone(), self.metadata.name.clone())
    }

    /// Whether the fragment has been marked for deletion.
    #[inline]
    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    #[inline]
    #[must_use]
    pub fn has_finalizer(&self, finalizer: &str) -> bool {
        self.metadata.finalizers.iter().any(|f| f == finalizer)
    }

    /// Add a finalizer if absent. Returns whether the list changed.
    pub fn add_finalizer(&mut self, finalizer: &str) -> bool {
        if self.has_finalizer(finalizer) {
            return false;
        }
        self.metadata.finalizers.push(finalizer.to_string());
        true
    }

    /// Remove a finalizer if present. Returns whether the list changed.
    pub fn remove_finalizer(&mut self, finalizer: &str) -> bool {
        let before = self.metadata.finalizers.len();
        self.metadata.finalizers.retain(|f| f != finalizer);
        self.metadata.finalizers.len() != before
    }
}

/// Desired state of a fragment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentSpec {
    /// Name of the derived artifact this fragment wants maintained.
    /// Immutable once set; the store rejects writes that clear or change
    /// it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_artifact: Option<String>,

    /// Label query whose matches are folded into this fragment's
    /// resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<LabelSelector>,

    /// Name of a fragment that fully substitutes for this one. When set,
    /// own content and the merge selector are ignored for resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace: Option<String>,

    /// The fragment's own declarative content.
    #[serde(default)]
    pub content: BootConfigContent,
}

/// Observed state of a fragment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FragmentStatus {
    /// Condition records keyed by type, updated in place.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Names of root fragments that have used this fragment in a
    /// resolution. Append-only and de-duplicated; entries are never
    /// pruned when graph edges change.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display() {
        let key = FragmentKey::new("metal", "base");
        assert_eq!(key.to_string(), "metal/base");
    }

    #[test]
    fn key_orders_by_namespace_then_name() {
        let a = FragmentKey::new("a", "z");
        let b = FragmentKey::new("b", "a");
        assert!(a < b);
    }

    #[test]
    fn finalizer_add_remove() {
        let mut fragment = Fragment::default();
        assert!(fragment.add_finalizer("ember.dev/test"));
        assert!(!fragment.add_finalizer("ember.dev/test"));
        assert!(fragment.has_finalizer("ember.dev/test"));
        assert!(fragment.remove_finalizer("ember.dev/test"));
        assert!(!fragment.remove_finalizer("ember.dev/test"));
    }

    #[test]
    fn deleting_tracks_timestamp() {
        let mut fragment = Fragment::default();
        assert!(!fragment.is_deleting());
        fragment.metadata.deletion_timestamp = Some(Utc::now());
        assert!(fragment.is_deleting());
    }
}
