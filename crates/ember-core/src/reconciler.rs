//! The per-invocation reconcile state machine.

use crate::artifact::ArtifactManager;
use crate::error::ReconcileError;
use crate::resolver::GraphResolver;
use crate::status::StatusReconciler;
use ember_config::to_payload;
use ember_store::{FragmentKey, FragmentStore};
use std::sync::Arc;

/// Finalizer gating fragment deletion until cleanup bookkeeping ran.
pub const FINALIZER: &str = "ember.dev/fragment-protection";

/// Sequences one reconcile invocation for a single fragment.
///
/// The invoking watch/queue runtime serializes invocations per fragment
/// identity and retries with backoff on error; any returned error aborts
/// the remaining steps. Conflicting concurrent writes surface as store
/// conflicts and are always safe to retry from scratch.
#[derive(Debug)]
pub struct Reconciler<S> {
    store: Arc<S>,
}

impl<S> Clone for Reconciler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: FragmentStore> Reconciler<S> {
    #[inline]
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Run one reconcile pass for the fragment at `key`.
    ///
    /// # Errors
    /// Any resolution, serialization or store failure after the validity
    /// step; the caller schedules the retry.
    pub async fn reconcile(&self, key: &FragmentKey) -> Result<(), ReconcileError> {
        let Some(mut fragment) = self.store.get(&key.namespace, &key.name).await? else {
            tracing::debug!(%key, "fragment already deleted, nothing to do");
            return Ok(());
        };

        // First-seen fragments get the finalizer before anything else; the
        // freshly-tracked event drives the readiness fan-out below.
        let mut freshly_tracked = false;
        if !fragment.is_deleting() && fragment.add_finalizer(FINALIZER) {
            fragment = self.store.update(&fragment).await?;
            freshly_tracked = true;
            tracing::info!(%key, "fragment tracked");
        }

        if fragment.is_deleting() {
            if fragment.remove_finalizer(FINALIZER) {
                self.store.update(&fragment).await?;
            }
            tracing::info!(%key, "released for deletion; artifact cleanup is ownership GC");
            return Ok(());
        }

        let status = StatusReconciler::new(self.store.as_ref());
        status.apply_validity(&mut fragment).await?;

        if freshly_tracked && fragment.spec.target_artifact.is_some() {
            status.invalidate_dependents(&fragment).await?;
        }

        let Some(target) = fragment.spec.target_artifact.clone() else {
            return Ok(());
        };

        let resolution = GraphResolver::new(self.store.as_ref())
            .resolve(&fragment)
            .await?;
        let payload = to_payload(&resolution.config)?;

        let action = ArtifactManager::new(self.store.as_ref())
            .reconcile(&fragment, payload)
            .await?;
        tracing::info!(%key, artifact = %target, ?action, contributors = resolution.contributors.len(), "reconciled");

        status
            .record_contributors(&fragment, &resolution.contributors)
            .await?;
        status.apply_readiness(&mut fragment, action).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{CONDITION_ARTIFACT_READY, CONDITION_CONTENT_VALID};
    use ember_store::InMemoryStore;
    use ember_test_utils::{key, FragmentBuilder};

    fn reconciler(store: &Arc<InMemoryStore>) -> Reconciler<InMemoryStore> {
        Reconciler::new(Arc::clone(store))
    }

    fn condition_status(
        fragment: &ember_store::Fragment,
        condition_type: &str,
    ) -> Option<bool> {
        fragment
            .status
            .conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
            .map(|c| c.status)
    }

    #[tokio::test]
    async fn missing_fragment_is_silent() {
        let store = Arc::new(InMemoryStore::new());
        reconciler(&store)
            .reconcile(&key("metal", "gone"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn first_pass_adds_finalizer_and_validity() {
        let store = Arc::new(InMemoryStore::new());
        FragmentBuilder::new("metal", "plain").store_in(&store);

        reconciler(&store)
            .reconcile(&key("metal", "plain"))
            .await
            .unwrap();

        let fragment = store.get("metal", "plain").await.unwrap().unwrap();
        assert!(fragment.has_finalizer(FINALIZER));
        assert_eq!(condition_status(&fragment, CONDITION_CONTENT_VALID), Some(true));
        // No target: nothing resolved, no readiness, no artifact.
        assert_eq!(condition_status(&fragment, CONDITION_ARTIFACT_READY), None);
        assert_eq!(store.artifact_count(), 0);
    }

    #[tokio::test]
    async fn invalid_content_sets_condition_without_failing() {
        let store = Arc::new(InMemoryStore::new());
        FragmentBuilder::new("metal", "bad")
            .version("2.0.0")
            .store_in(&store);

        reconciler(&store)
            .reconcile(&key("metal", "bad"))
            .await
            .unwrap();

        let fragment = store.get("metal", "bad").await.unwrap().unwrap();
        assert_eq!(condition_status(&fragment, CONDITION_CONTENT_VALID), Some(false));
    }

    #[tokio::test]
    async fn target_drives_artifact_and_two_phase_readiness() {
        let store = Arc::new(InMemoryStore::new());
        FragmentBuilder::new("metal", "root")
            .kernel_args_exist(&["quiet"])
            .target("boot-secret")
            .store_in(&store);
        let reconciler = reconciler(&store);

        // First pass creates the artifact; readiness stays false.
        reconciler.reconcile(&key("metal", "root")).await.unwrap();
        assert_eq!(store.artifact_count(), 1);
        let fragment = store.get("metal", "root").await.unwrap().unwrap();
        assert_eq!(condition_status(&fragment, CONDITION_ARTIFACT_READY), Some(false));

        // Second pass finds the artifact unchanged and converges.
        reconciler.reconcile(&key("metal", "root")).await.unwrap();
        let fragment = store.get("metal", "root").await.unwrap().unwrap();
        assert_eq!(condition_status(&fragment, CONDITION_ARTIFACT_READY), Some(true));
    }

    #[tokio::test]
    async fn deletion_path_releases_finalizer() {
        let store = Arc::new(InMemoryStore::new());
        FragmentBuilder::new("metal", "root")
            .target("boot-secret")
            .store_in(&store);
        let reconciler = reconciler(&store);

        reconciler.reconcile(&key("metal", "root")).await.unwrap();
        assert_eq!(store.artifact_count(), 1);

        store.delete_fragment("metal", "root").unwrap();
        reconciler.reconcile(&key("metal", "root")).await.unwrap();

        // Finalizer released: object gone and artifact collected.
        assert!(store.get("metal", "root").await.unwrap().is_none());
        assert_eq!(store.artifact_count(), 0);
    }

    #[tokio::test]
    async fn resolution_failure_aborts_and_surfaces() {
        let store = Arc::new(InMemoryStore::new());
        FragmentBuilder::new("metal", "root")
            .replace("root")
            .target("boot-secret")
            .store_in(&store);

        let err = reconciler(&store)
            .reconcile(&key("metal", "root"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Resolve(_)));
        assert_eq!(store.artifact_count(), 0);
    }
}
