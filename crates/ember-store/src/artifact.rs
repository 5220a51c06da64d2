//! Derived artifact object.

use crate::fragment::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The key under which the serialized merged config is stored. Fixed, not
/// configurable.
pub const PAYLOAD_KEY: &str = "config";

/// The persisted output of a fragment resolution.
///
/// Named by the owning fragment's target reference, namespaced with its
/// owner, and garbage-collected by the store when the owner is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DerivedArtifact {
    pub metadata: ObjectMeta,
    pub data: BTreeMap<String, Vec<u8>>,
}

impl DerivedArtifact {
    /// The serialized config payload, if present.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        self.data.get(PAYLOAD_KEY).map(Vec::as_slice)
    }
}
