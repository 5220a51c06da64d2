//! Recursive graph resolution.
//!
//! Walks the fragment graph from a root, short-circuiting through replace
//! references and folding merge-selector matches, with uniform cycle
//! detection across both relation kinds.

use crate::error::ResolveError;
use ember_config::{convert, merge, BootConfig};
use ember_store::{Fragment, FragmentKey, FragmentStore};
use futures::future::BoxFuture;
use std::collections::BTreeSet;

/// Outcome of resolving one root fragment.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The merged configuration.
    pub config: BootConfig,

    /// Every fragment identity visited during the walk, the root
    /// included. Recorded as reverse dependencies afterwards.
    pub contributors: BTreeSet<FragmentKey>,
}

/// Resolves a fragment graph against a store snapshot.
///
/// Resolution is a pure function of the reachable graph at invocation
/// time: the visited set lives for a single [`resolve`](Self::resolve)
/// call and nothing is cached across calls.
#[derive(Debug)]
pub struct GraphResolver<'a, S: FragmentStore> {
    store: &'a S,
}

impl<'a, S: FragmentStore> GraphResolver<'a, S> {
    #[inline]
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolve the graph rooted at `root` into one merged config.
    ///
    /// # Errors
    /// [`ResolveError::CycleDetected`] when any fragment is reachable
    /// twice, [`ResolveError::ReferenceNotFound`] when a replace target is
    /// missing, [`ResolveError::ConversionFailed`] when a visited
    /// fragment's content is invalid, [`ResolveError::MergeFailed`] on
    /// merger-reported incompatibility.
    pub async fn resolve(&self, root: &Fragment) -> Result<Resolution, ResolveError> {
        let mut visited = BTreeSet::new();
        let config = self.resolve_node(root.clone(), &mut visited).await?;
        Ok(Resolution {
            config,
            contributors: visited,
        })
    }

    /// One node of the walk. Boxed so the async recursion has a known
    /// size; the visited set is shared mutably across the whole call so a
    /// fragment cannot be revisited via any path.
    fn resolve_node<'b>(
        &'b self,
        fragment: Fragment,
        visited: &'b mut BTreeSet<FragmentKey>,
    ) -> BoxFuture<'b, Result<BootConfig, ResolveError>> {
        Box::pin(async move {
            let key = fragment.key();
            if !visited.insert(key.clone()) {
                return Err(ResolveError::CycleDetected(key));
            }

            // Replace short-circuits: this node *is* the referenced node,
            // own content and merge selector contribute nothing.
            if let Some(replace) = &fragment.spec.replace {
                let namespace = &fragment.metadata.namespace;
                let target = self
                    .store
                    .get(namespace, replace)
                    .await?
                    .ok_or_else(|| {
                        ResolveError::ReferenceNotFound(FragmentKey::new(
                            namespace.clone(),
                            replace.clone(),
                        ))
                    })?;
                tracing::debug!(from = %key, to = %target.key(), "following replace reference");
                return self.resolve_node(target, visited).await;
            }

            let own = convert(&fragment.spec.content).map_err(|source| {
                ResolveError::ConversionFailed {
                    key: key.clone(),
                    source,
                }
            })?;

            let Some(selector) = &fragment.spec.merge else {
                return Ok(own);
            };

            let mut matches = self
                .store
                .list(&fragment.metadata.namespace, selector)
                .await?;
            // Listing order is not stable; the name sort is the sole
            // determinism guarantee for the fold.
            matches.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
            tracing::debug!(root = %key, matches = matches.len(), "folding merge selector matches");

            let mut folded = BootConfig::identity();
            for matched in matches {
                let child = self.resolve_node(matched, &mut *visited).await?;
                folded = merge(folded, child).map_err(|source| ResolveError::MergeFailed {
                    key: key.clone(),
                    source,
                })?;
            }

            merge(own, folded).map_err(|source| ResolveError::MergeFailed { key, source })
        })
    }
}
