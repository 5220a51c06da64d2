//! Error types for boot-config conversion, merging and encoding.

/// Content failed validation and could not become a [`crate::BootConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Version field missing or not a supported release.
    #[error("unsupported config version {0:?}")]
    UnsupportedVersion(String),

    /// A named entry (unit, user, group, dropin) has an empty name.
    #[error("empty {0} name")]
    EmptyName(&'static str),

    /// Systemd unit name does not carry a recognized suffix.
    #[error("systemd unit {0:?} has an unrecognized suffix")]
    InvalidUnitSuffix(String),

    /// Storage disk or filesystem without a device.
    #[error("storage {0} has an empty device")]
    EmptyDevice(&'static str),

    /// File or filesystem path is not absolute.
    #[error("path {0:?} is not absolute")]
    RelativePath(String),

    /// Two entries of the same kind collide on their key.
    #[error("duplicate {kind} entry {name:?}")]
    Duplicate {
        kind: &'static str,
        name: String,
    },
}

/// Two values could not be combined.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// Base and overlay carry different config format versions.
    #[error("cannot merge config version {overlay:?} into {base:?}")]
    VersionMismatch { base: String, overlay: String },
}

/// The merged value could not be encoded into payload bytes.
#[derive(Debug, thiserror::Error)]
#[error("config serialization failed: {0}")]
pub struct SerializationError(#[from] serde_json::Error);
