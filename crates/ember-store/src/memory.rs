//! In-memory, versioned store implementation.

use crate::artifact::DerivedArtifact;
use crate::fragment::{Fragment, FragmentKey};
use crate::selector::LabelSelector;
use crate::store::{FragmentStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// An in-process [`FragmentStore`] with optimistic concurrency.
///
/// Every accepted write bumps a store-wide version counter onto the
/// object. Deletion is finalizer-gated: objects with finalizers are only
/// marked with a deletion timestamp, and removed once the last finalizer
/// is cleared. Removing a fragment cascades to artifacts whose owner
/// reference carries its UID — the garbage collection the core delegates
/// to the store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    fragments: HashMap<FragmentKey, Fragment>,
    artifacts: HashMap<FragmentKey, DerivedArtifact>,
    next_version: u64,
}

impl Inner {
    fn bump(&mut self) -> u64 {
        self.next_version += 1;
        self.next_version
    }

    fn collect_owned(&mut self, owner_uid: Uuid) {
        self.artifacts
            .retain(|_, artifact| match &artifact.metadata.owner {
                Some(owner) => owner.uid != owner_uid,
                None => true,
            });
    }
}

impl InMemoryStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fragment, assigning a UID and fresh resource version.
    ///
    /// Seeding entry point for embedders and tests; external actors create
    /// fragments, the reconciliation core only reads them.
    pub fn insert_fragment(&self, mut fragment: Fragment) -> Fragment {
        let mut inner = self.inner.write();
        if fragment.metadata.uid.is_nil() {
            fragment.metadata.uid = Uuid::new_v4();
        }
        fragment.metadata.resource_version = inner.bump();
        inner.fragments.insert(fragment.key(), fragment.clone());
        fragment
    }

    /// Request deletion of a fragment.
    ///
    /// With finalizers present this only stamps the deletion timestamp;
    /// the object disappears (and its owned artifacts with it) once the
    /// finalizer list empties.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when the fragment does not exist.
    pub fn delete_fragment(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let key = FragmentKey::new(namespace, name);
        let mut inner = self.inner.write();
        let Some(fragment) = inner.fragments.get_mut(&key) else {
            return Err(StoreError::NotFound(key.to_string()));
        };

        if fragment.metadata.finalizers.is_empty() {
            let uid = fragment.metadata.uid;
            inner.fragments.remove(&key);
            inner.collect_owned(uid);
            return Ok(());
        }

        if fragment.metadata.deletion_timestamp.is_none() {
            fragment.metadata.deletion_timestamp = Some(Utc::now());
            let version = inner.bump();
            if let Some(fragment) = inner.fragments.get_mut(&key) {
                fragment.metadata.resource_version = version;
            }
        }
        Ok(())
    }

    /// Number of stored artifacts. Test/observability helper.
    #[must_use]
    pub fn artifact_count(&self) -> usize {
        self.inner.read().artifacts.len()
    }

    /// Number of stored fragments. Test/observability helper.
    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.inner.read().fragments.len()
    }
}

#[async_trait]
impl FragmentStore for InMemoryStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Fragment>, StoreError> {
        let key = FragmentKey::new(namespace, name);
        Ok(self.inner.read().fragments.get(&key).cloned())
    }

    async fn list(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<Fragment>, StoreError> {
        Ok(self
            .inner
            .read()
            .fragments
            .values()
            .filter(|f| f.metadata.namespace == namespace && selector.matches(&f.metadata.labels))
            .cloned()
            .collect())
    }

    async fn update(&self, fragment: &Fragment) -> Result<Fragment, StoreError> {
        let key = fragment.key();
        let mut inner = self.inner.write();
        let Some(stored) = inner.fragments.get(&key) else {
            return Err(StoreError::NotFound(key.to_string()));
        };

        if stored.metadata.resource_version != fragment.metadata.resource_version {
            return Err(StoreError::Conflict {
                key: key.to_string(),
                expected: fragment.metadata.resource_version,
                found: stored.metadata.resource_version,
            });
        }
        if let Some(previous) = &stored.spec.target_artifact {
            if fragment.spec.target_artifact.as_ref() != Some(previous) {
                return Err(StoreError::ImmutableField {
                    key: key.to_string(),
                    field: "targetArtifact",
                });
            }
        }

        let mut next = fragment.clone();
        // Server-owned fields survive client updates.
        next.status = stored.status.clone();
        next.metadata.uid = stored.metadata.uid;
        next.metadata.deletion_timestamp = stored.metadata.deletion_timestamp;
        next.metadata.resource_version = inner.bump();

        if next.is_deleting() && next.metadata.finalizers.is_empty() {
            // Last finalizer cleared: complete the deletion and collect
            // owned artifacts.
            let uid = next.metadata.uid;
            inner.fragments.remove(&key);
            inner.collect_owned(uid);
            return Ok(next);
        }

        inner.fragments.insert(key, next.clone());
        Ok(next)
    }

    async fn patch_status(&self, fragment: &Fragment) -> Result<Fragment, StoreError> {
        let key = fragment.key();
        let mut inner = self.inner.write();
        let Some(stored) = inner.fragments.get(&key) else {
            return Err(StoreError::NotFound(key.to_string()));
        };
        if stored.metadata.resource_version != fragment.metadata.resource_version {
            return Err(StoreError::Conflict {
                key: key.to_string(),
                expected: fragment.metadata.resource_version,
                found: stored.metadata.resource_version,
            });
        }
        let version = inner.bump();
        let Some(stored) = inner.fragments.get_mut(&key) else {
            return Err(StoreError::NotFound(key.to_string()));
        };
        stored.status = fragment.status.clone();
        stored.metadata.resource_version = version;
        Ok(stored.clone())
    }

    async fn get_artifact(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DerivedArtifact>, StoreError> {
        let key = FragmentKey::new(namespace, name);
        Ok(self.inner.read().artifacts.get(&key).cloned())
    }

    async fn create_or_update_artifact(
        &self,
        artifact: &DerivedArtifact,
    ) -> Result<DerivedArtifact, StoreError> {
        let key = FragmentKey::new(
            artifact.metadata.namespace.clone(),
            artifact.metadata.name.clone(),
        );
        let mut inner = self.inner.write();

        if let Some(stored) = inner.artifacts.get(&key) {
            if stored.metadata.resource_version != artifact.metadata.resource_version {
                return Err(StoreError::Conflict {
                    key: key.to_string(),
                    expected: artifact.metadata.resource_version,
                    found: stored.metadata.resource_version,
                });
            }
        }

        let mut next = artifact.clone();
        if next.metadata.uid.is_nil() {
            next.metadata.uid = Uuid::new_v4();
        }
        next.metadata.resource_version = inner.bump();
        inner.artifacts.insert(key, next.clone());
        Ok(next)
    }
}
