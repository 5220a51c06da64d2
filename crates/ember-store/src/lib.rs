//! Ember fragment store
//!
//! Object model and store accessor boundary for configuration fragments
//! and their derived artifacts.
//!
//! # Core Concepts
//!
//! - [`Fragment`]: a unit of declarative boot configuration that may merge
//!   or replace other fragments
//! - [`DerivedArtifact`]: the persisted output holding the serialized
//!   merged config under [`PAYLOAD_KEY`]
//! - [`FragmentStore`]: the async accessor trait with optimistic
//!   single-writer-wins-or-conflict write semantics
//! - [`InMemoryStore`]: a versioned in-process implementation with
//!   finalizer-aware deletion and ownership-cascade garbage collection
//! - [`LabelSelector`]: the label query matched by merge directives

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod artifact;
mod condition;
mod fragment;
mod memory;
mod selector;
mod store;

pub use artifact::{DerivedArtifact, PAYLOAD_KEY};
pub use condition::{set_condition, Condition};
pub use fragment::{Fragment, FragmentKey, FragmentSpec, FragmentStatus, ObjectMeta, OwnerReference};
pub use memory::InMemoryStore;
pub use selector::{LabelSelector, LabelSelectorRequirement, SelectorOperator};
pub use store::{FragmentStore, StoreError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
