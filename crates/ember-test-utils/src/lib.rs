//! Testing utilities for the Ember workspace
//!
//! Shared fragment builders and store seeding helpers.

#![allow(missing_docs)]

use ember_config::{BootConfigContent, KernelArguments};
use ember_store::{Fragment, FragmentKey, InMemoryStore, LabelSelector};

pub const TEST_VERSION: &str = "3.5.0";

/// Builder for fragments used across unit and integration tests.
#[derive(Debug, Clone)]
pub struct FragmentBuilder {
    fragment: Fragment,
}

impl FragmentBuilder {
    #[must_use]
    pub fn new(namespace: &str, name: &str) -> Self {
        let mut fragment = Fragment::default();
        fragment.metadata.namespace = namespace.to_string();
        fragment.metadata.name = name.to_string();
        fragment.spec.content.version = TEST_VERSION.to_string();
        Self { fragment }
    }

    #[must_use]
    pub fn version(mut self, version: &str) -> Self {
        self.fragment.spec.content.version = version.to_string();
        self
    }

    #[must_use]
    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.fragment
            .metadata
            .labels
            .insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn kernel_args_exist(mut self, args: &[&str]) -> Self {
        self.fragment.spec.content.kernel_arguments = KernelArguments {
            should_exist: args.iter().map(ToString::to_string).collect(),
            should_not_exist: self
                .fragment
                .spec
                .content
                .kernel_arguments
                .should_not_exist
                .clone(),
        };
        self
    }

    #[must_use]
    pub fn kernel_args_absent(mut self, args: &[&str]) -> Self {
        self.fragment.spec.content.kernel_arguments.should_not_exist =
            args.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn content(mut self, content: BootConfigContent) -> Self {
        self.fragment.spec.content = content;
        self
    }

    #[must_use]
    pub fn merge_selector(mut self, selector: LabelSelector) -> Self {
        self.fragment.spec.merge = Some(selector);
        self
    }

    /// Merge everything carrying `key=value`.
    #[must_use]
    pub fn merge_label(self, key: &str, value: &str) -> Self {
        self.merge_selector(LabelSelector::matching(key, value))
    }

    #[must_use]
    pub fn replace(mut self, name: &str) -> Self {
        self.fragment.spec.replace = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn target(mut self, artifact_name: &str) -> Self {
        self.fragment.spec.target_artifact = Some(artifact_name.to_string());
        self
    }

    #[must_use]
    pub fn build(self) -> Fragment {
        self.fragment
    }

    /// Build and insert into the store, returning the stored fragment
    /// with its assigned UID and resource version.
    pub fn store_in(self, store: &InMemoryStore) -> Fragment {
        store.insert_fragment(self.fragment)
    }
}

#[must_use]
pub fn key(namespace: &str, name: &str) -> FragmentKey {
    FragmentKey::new(namespace, name)
}
