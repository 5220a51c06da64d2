//! Condition bookkeeping and the reverse-dependency index.

use crate::error::ReconcileError;
use crate::ArtifactAction;
use ember_config::convert;
use ember_store::{set_condition, Condition, Fragment, FragmentKey, FragmentStore, LabelSelector};
use std::collections::BTreeSet;

/// Condition type: the fragment's own content converts cleanly, graph
/// position aside.
pub const CONDITION_CONTENT_VALID: &str = "ContentValid";

/// Condition type: the derived artifact matches the latest resolution.
pub const CONDITION_ARTIFACT_READY: &str = "ArtifactReady";

pub const REASON_CONVERSION_SUCCEEDED: &str = "ConversionSucceeded";
pub const REASON_CONVERSION_FAILED: &str = "ConversionFailed";
pub const REASON_IN_SYNC: &str = "InSync";
pub const REASON_CONVERGING: &str = "Converging";
pub const REASON_GRAPH_CHANGED: &str = "GraphChanged";

/// Computes and idempotently applies fragment status.
///
/// Status writes go through read-modify-write with the observed resource
/// version as precondition; when the computed condition matches the stored
/// one, no write happens at all.
#[derive(Debug)]
pub struct StatusReconciler<'a, S: FragmentStore> {
    store: &'a S,
}

impl<'a, S: FragmentStore> StatusReconciler<'a, S> {
    #[inline]
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Upsert one condition and patch status when it changed anything.
    ///
    /// Refreshes `fragment` with the stored object on write. Returns
    /// whether a write occurred.
    ///
    /// # Errors
    /// Store errors from the status patch, conflicts included.
    pub async fn apply_condition(
        &self,
        fragment: &mut Fragment,
        condition: Condition,
    ) -> Result<bool, ReconcileError> {
        if !set_condition(&mut fragment.status.conditions, condition) {
            return Ok(false);
        }
        *fragment = self.store.patch_status(fragment).await?;
        Ok(true)
    }

    /// Recompute and apply the validity condition.
    ///
    /// Conversion failure lands in the condition message and nothing
    /// else — it does not abort the invocation. A fragment can be
    /// internally valid while its graph still fails to resolve, and vice
    /// versa.
    pub async fn apply_validity(&self, fragment: &mut Fragment) -> Result<bool, ReconcileError> {
        let condition = match convert(&fragment.spec.content) {
            Ok(_) => Condition::new(
                CONDITION_CONTENT_VALID,
                true,
                REASON_CONVERSION_SUCCEEDED,
                "content is a valid boot configuration",
            ),
            Err(err) => Condition::new(
                CONDITION_CONTENT_VALID,
                false,
                REASON_CONVERSION_FAILED,
                err.to_string(),
            ),
        };
        self.apply_condition(fragment, condition).await
    }

    /// Apply the readiness condition from this pass's artifact action.
    ///
    /// Ready is true only when the write found nothing to change — a
    /// create or update leaves the fragment converging until a later pass
    /// confirms the artifact already matched.
    pub async fn apply_readiness(
        &self,
        fragment: &mut Fragment,
        action: ArtifactAction,
    ) -> Result<bool, ReconcileError> {
        let condition = if action == ArtifactAction::Unchanged {
            Condition::new(
                CONDITION_ARTIFACT_READY,
                true,
                REASON_IN_SYNC,
                "derived artifact matches the resolved configuration",
            )
        } else {
            Condition::new(
                CONDITION_ARTIFACT_READY,
                false,
                REASON_CONVERGING,
                "derived artifact was written this pass; awaiting convergence",
            )
        };
        self.apply_condition(fragment, condition).await
    }

    /// Record the root on every contributor's reverse-dependency list.
    ///
    /// The index is monotonic: names are appended once and never pruned,
    /// even if the edge that created the dependency later disappears.
    pub async fn record_contributors(
        &self,
        root: &Fragment,
        contributors: &BTreeSet<FragmentKey>,
    ) -> Result<(), ReconcileError> {
        let root_key = root.key();
        for key in contributors {
            if *key == root_key {
                continue;
            }
            let Some(mut contributor) = self.store.get(&key.namespace, &key.name).await? else {
                // Contributor vanished since resolution; its entry dies
                // with it.
                tracing::debug!(contributor = %key, "skipping back-reference to deleted fragment");
                continue;
            };
            if contributor
                .status
                .contributors
                .iter()
                .any(|name| name == &root_key.name)
            {
                continue;
            }
            contributor.status.contributors.push(root_key.name.clone());
            self.store.patch_status(&contributor).await?;
            tracing::debug!(contributor = %key, root = %root_key, "recorded reverse dependency");
        }
        Ok(())
    }

    /// Coarse invalidation fan-out for a freshly tracked fragment.
    ///
    /// Forces readiness false on every other fragment in the namespace
    /// that previously used this fragment, or that maintains an artifact
    /// of its own. This only signals that a recompute may be pending;
    /// recomputation happens when those fragments are reconciled
    /// independently.
    pub async fn invalidate_dependents(&self, fragment: &Fragment) -> Result<(), ReconcileError> {
        let key = fragment.key();
        let others = self
            .store
            .list(&fragment.metadata.namespace, &LabelSelector::default())
            .await?;

        for mut other in others {
            if other.key() == key {
                continue;
            }
            let used_by_other = fragment
                .status
                .contributors
                .iter()
                .any(|name| name == &other.metadata.name);
            if !used_by_other && other.spec.target_artifact.is_none() {
                continue;
            }

            let condition = Condition::new(
                CONDITION_ARTIFACT_READY,
                false,
                REASON_GRAPH_CHANGED,
                format!("fragment {key} joined the graph; recompute may be pending"),
            );
            if set_condition(&mut other.status.conditions, condition) {
                self.store.patch_status(&other).await?;
                tracing::debug!(invalidated = %other.key(), cause = %key, "readiness invalidated");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_store::InMemoryStore;
    use ember_test_utils::{key, FragmentBuilder};

    fn condition<'c>(fragment: &'c Fragment, condition_type: &str) -> &'c Condition {
        fragment
            .status
            .conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
            .expect("condition present")
    }

    #[tokio::test]
    async fn validity_true_for_convertible_content() {
        let store = InMemoryStore::new();
        let mut fragment = FragmentBuilder::new("metal", "good").store_in(&store);

        let status = StatusReconciler::new(&store);
        assert!(status.apply_validity(&mut fragment).await.unwrap());
        let valid = condition(&fragment, CONDITION_CONTENT_VALID);
        assert!(valid.status);
        assert_eq!(valid.reason, REASON_CONVERSION_SUCCEEDED);

        // Second application is a no-op, no write amplification.
        assert!(!status.apply_validity(&mut fragment).await.unwrap());
    }

    #[tokio::test]
    async fn validity_false_carries_converter_diagnostic() {
        let store = InMemoryStore::new();
        let mut fragment = FragmentBuilder::new("metal", "bad")
            .version("2.0.0")
            .store_in(&store);

        let status = StatusReconciler::new(&store);
        assert!(status.apply_validity(&mut fragment).await.unwrap());
        let valid = condition(&fragment, CONDITION_CONTENT_VALID);
        assert!(!valid.status);
        assert_eq!(valid.reason, REASON_CONVERSION_FAILED);
        assert!(valid.message.contains("2.0.0"));
    }

    #[tokio::test]
    async fn readiness_tracks_artifact_action() {
        let store = InMemoryStore::new();
        let mut fragment = FragmentBuilder::new("metal", "root").store_in(&store);
        let status = StatusReconciler::new(&store);

        status
            .apply_readiness(&mut fragment, ArtifactAction::Created)
            .await
            .unwrap();
        assert!(!condition(&fragment, CONDITION_ARTIFACT_READY).status);

        status
            .apply_readiness(&mut fragment, ArtifactAction::Unchanged)
            .await
            .unwrap();
        let ready = condition(&fragment, CONDITION_ARTIFACT_READY);
        assert!(ready.status);
        assert_eq!(ready.reason, REASON_IN_SYNC);
    }

    #[tokio::test]
    async fn contributors_recorded_once_excluding_root() {
        let store = InMemoryStore::new();
        let root = FragmentBuilder::new("metal", "root").store_in(&store);
        FragmentBuilder::new("metal", "leaf").store_in(&store);

        let contributors = BTreeSet::from([key("metal", "root"), key("metal", "leaf")]);
        let status = StatusReconciler::new(&store);
        status
            .record_contributors(&root, &contributors)
            .await
            .unwrap();
        status
            .record_contributors(&root, &contributors)
            .await
            .unwrap();

        let leaf = store.get("metal", "leaf").await.unwrap().unwrap();
        assert_eq!(leaf.status.contributors, vec!["root"]);
        let root = store.get("metal", "root").await.unwrap().unwrap();
        assert!(root.status.contributors.is_empty());
    }

    #[tokio::test]
    async fn vanished_contributor_is_skipped() {
        let store = InMemoryStore::new();
        let root = FragmentBuilder::new("metal", "root").store_in(&store);
        let contributors = BTreeSet::from([key("metal", "root"), key("metal", "gone")]);

        StatusReconciler::new(&store)
            .record_contributors(&root, &contributors)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn invalidation_targets_dependents_and_artifact_owners() {
        let store = InMemoryStore::new();
        // "user" previously resolved through "joined"; "owner" maintains
        // its own artifact; "bystander" does neither.
        FragmentBuilder::new("metal", "user").store_in(&store);
        FragmentBuilder::new("metal", "owner")
            .target("owner-secret")
            .store_in(&store);
        FragmentBuilder::new("metal", "bystander").store_in(&store);

        let mut joined = FragmentBuilder::new("metal", "joined")
            .target("joined-secret")
            .store_in(&store);
        joined.status.contributors.push("user".to_string());
        let joined = store.patch_status(&joined).await.unwrap();

        StatusReconciler::new(&store)
            .invalidate_dependents(&joined)
            .await
            .unwrap();

        let user = store.get("metal", "user").await.unwrap().unwrap();
        let ready = condition(&user, CONDITION_ARTIFACT_READY);
        assert!(!ready.status);
        assert_eq!(ready.reason, REASON_GRAPH_CHANGED);

        let owner = store.get("metal", "owner").await.unwrap().unwrap();
        assert!(!condition(&owner, CONDITION_ARTIFACT_READY).status);

        let bystander = store.get("metal", "bystander").await.unwrap().unwrap();
        assert!(bystander.status.conditions.is_empty());

        // The fragment that joined is not self-invalidated.
        let joined = store.get("metal", "joined").await.unwrap().unwrap();
        assert!(joined.status.conditions.is_empty());
    }
}
