//! Ember reconciliation core
//!
//! Resolves a directed graph of boot-configuration fragments into one
//! merged config per root and keeps the derived artifact convergent with
//! that resolution.
//!
//! # Core Concepts
//!
//! - [`GraphResolver`]: recursive traversal with cycle detection, replace
//!   short-circuit and name-sorted merge folding
//! - [`StatusReconciler`]: validity/readiness conditions and the
//!   append-only reverse-dependency index
//! - [`ArtifactManager`]: create-or-patch of the derived artifact with
//!   ownership linkage
//! - [`Reconciler`]: the per-invocation state machine tying it together
//!
//! The invoking watch/queue runtime is an external collaborator: it
//! serializes invocations per fragment identity, owns retry/backoff, and
//! cancels in-flight work by dropping the reconcile future.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod artifact;
mod error;
mod reconciler;
mod resolver;
mod status;

pub use artifact::{ArtifactAction, ArtifactManager};
pub use error::{ReconcileError, ResolveError};
pub use reconciler::{Reconciler, FINALIZER};
pub use resolver::{GraphResolver, Resolution};
pub use status::{
    StatusReconciler, CONDITION_ARTIFACT_READY, CONDITION_CONTENT_VALID, REASON_CONVERGING,
    REASON_CONVERSION_FAILED, REASON_CONVERSION_SUCCEEDED, REASON_GRAPH_CHANGED, REASON_IN_SYNC,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
