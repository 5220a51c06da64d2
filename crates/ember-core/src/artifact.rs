//! Derived artifact lifecycle.

use crate::error::ReconcileError;
use ember_store::{
    DerivedArtifact, Fragment, FragmentStore, ObjectMeta, OwnerReference, PAYLOAD_KEY,
};
use std::collections::BTreeMap;

/// What a reconcile pass did to the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactAction {
    /// The artifact did not exist and was created.
    Created,
    /// The artifact existed with a different payload and was overwritten.
    Updated,
    /// The artifact already matched; no write happened.
    Unchanged,
}

/// Convergent create-or-patch of the derived artifact.
///
/// Never deletes: removal is entirely the store's ownership-based garbage
/// collection when the owning fragment goes away.
#[derive(Debug)]
pub struct ArtifactManager<'a, S: FragmentStore> {
    store: &'a S,
}

impl<'a, S: FragmentStore> ArtifactManager<'a, S> {
    #[inline]
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Bring the owner's declared artifact in line with `payload`.
    ///
    /// No-op returning [`ArtifactAction::Unchanged`] when the owner
    /// declares no target; callers normally guard on that earlier.
    ///
    /// # Errors
    /// Store errors from the artifact read or conditional write.
    pub async fn reconcile(
        &self,
        owner: &Fragment,
        payload: Vec<u8>,
    ) -> Result<ArtifactAction, ReconcileError> {
        let Some(name) = &owner.spec.target_artifact else {
            return Ok(ArtifactAction::Unchanged);
        };
        let namespace = &owner.metadata.namespace;
        let owner_ref = OwnerReference {
            name: owner.metadata.name.clone(),
            uid: owner.metadata.uid,
        };

        match self.store.get_artifact(namespace, name).await? {
            None => {
                let artifact = DerivedArtifact {
                    metadata: ObjectMeta {
                        namespace: namespace.clone(),
                        name: name.clone(),
                        owner: Some(owner_ref),
                        ..ObjectMeta::default()
                    },
                    data: BTreeMap::from([(PAYLOAD_KEY.to_string(), payload)]),
                };
                self.store.create_or_update_artifact(&artifact).await?;
                tracing::info!(namespace = %namespace, artifact = %name, "created derived artifact");
                Ok(ArtifactAction::Created)
            }
            Some(existing) if existing.payload() == Some(payload.as_slice()) => {
                Ok(ArtifactAction::Unchanged)
            }
            Some(mut existing) => {
                existing.data.insert(PAYLOAD_KEY.to_string(), payload);
                existing.metadata.owner = Some(owner_ref);
                self.store.create_or_update_artifact(&existing).await?;
                tracing::info!(namespace = %namespace, artifact = %name, "updated derived artifact");
                Ok(ArtifactAction::Updated)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_store::InMemoryStore;
    use ember_test_utils::FragmentBuilder;

    #[tokio::test]
    async fn create_then_unchanged_then_updated() {
        let store = InMemoryStore::new();
        let owner = FragmentBuilder::new("metal", "root")
            .target("boot-secret")
            .store_in(&store);
        let manager = ArtifactManager::new(&store);

        let action = manager.reconcile(&owner, b"one".to_vec()).await.unwrap();
        assert_eq!(action, ArtifactAction::Created);

        // Same payload: exactly one write total, second call is a no-op.
        let action = manager.reconcile(&owner, b"one".to_vec()).await.unwrap();
        assert_eq!(action, ArtifactAction::Unchanged);
        let stored = store.get_artifact("metal", "boot-secret").await.unwrap().unwrap();
        let version_after_noop = stored.metadata.resource_version;
        assert_eq!(stored.payload(), Some(b"one".as_slice()));

        let action = manager.reconcile(&owner, b"two".to_vec()).await.unwrap();
        assert_eq!(action, ArtifactAction::Updated);
        let stored = store.get_artifact("metal", "boot-secret").await.unwrap().unwrap();
        assert_eq!(stored.payload(), Some(b"two".as_slice()));
        assert!(stored.metadata.resource_version > version_after_noop);
    }

    #[tokio::test]
    async fn created_artifact_is_owner_linked() {
        let store = InMemoryStore::new();
        let owner = FragmentBuilder::new("metal", "root")
            .target("boot-secret")
            .store_in(&store);

        ArtifactManager::new(&store)
            .reconcile(&owner, b"payload".to_vec())
            .await
            .unwrap();

        let artifact = store.get_artifact("metal", "boot-secret").await.unwrap().unwrap();
        let link = artifact.metadata.owner.unwrap();
        assert_eq!(link.name, "root");
        assert_eq!(link.uid, owner.metadata.uid);
    }

    #[tokio::test]
    async fn no_target_means_no_write() {
        let store = InMemoryStore::new();
        let owner = FragmentBuilder::new("metal", "root").store_in(&store);

        let action = ArtifactManager::new(&store)
            .reconcile(&owner, b"payload".to_vec())
            .await
            .unwrap();
        assert_eq!(action, ArtifactAction::Unchanged);
        assert_eq!(store.artifact_count(), 0);
    }

    #[tokio::test]
    async fn update_reasserts_ownership() {
        let store = InMemoryStore::new();
        let owner = FragmentBuilder::new("metal", "root")
            .target("boot-secret")
            .store_in(&store);
        let manager = ArtifactManager::new(&store);
        manager.reconcile(&owner, b"one".to_vec()).await.unwrap();

        // Strip the owner link out-of-band.
        let mut artifact = store.get_artifact("metal", "boot-secret").await.unwrap().unwrap();
        artifact.metadata.owner = None;
        store.create_or_update_artifact(&artifact).await.unwrap();

        manager.reconcile(&owner, b"two".to_vec()).await.unwrap();
        let artifact = store.get_artifact("metal", "boot-secret").await.unwrap().unwrap();
        assert_eq!(artifact.metadata.owner.unwrap().uid, owner.metadata.uid);
    }
}
