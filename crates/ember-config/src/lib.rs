//! Ember boot-config values
//!
//! The mergeable configuration value that fragment resolution folds over.
//!
//! # Core Concepts
//!
//! - [`BootConfigContent`]: user-authored fragment content, unvalidated
//! - [`BootConfig`]: the opaque, validated, mergeable value
//! - [`convert`]: validation from content into a [`BootConfig`]
//! - [`merge`]: order-sensitive combination of two values
//! - [`to_payload`]: stable byte encoding for the derived artifact
//!
//! # Example
//!
//! ```rust,ignore
//! use ember_config::{convert, merge, to_payload};
//!
//! let own = convert(&fragment_content)?;
//! let merged = merge(own, overlay)?;
//! let bytes = to_payload(&merged)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod convert;
mod error;
mod merge;
mod payload;
mod schema;

pub use convert::{convert, SUPPORTED_VERSIONS};
pub use error::{ConversionError, MergeError, SerializationError};
pub use merge::merge;
pub use payload::to_payload;
pub use schema::{
    BootConfig, BootConfigContent, Disk, Dropin, File, Filesystem, KernelArguments, Partition,
    Passwd, PasswdGroup, PasswdUser, Storage, Systemd, Unit,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
