//! Validation of fragment content into an opaque [`BootConfig`].

use crate::error::ConversionError;
use crate::schema::{BootConfig, BootConfigContent};
use std::collections::BTreeSet;

/// Config format versions this engine accepts.
pub const SUPPORTED_VERSIONS: &[&str] = &["3.4.0", "3.5.0"];

/// Unit name suffixes systemd will load.
const UNIT_SUFFIXES: &[&str] = &[
    ".service",
    ".socket",
    ".timer",
    ".mount",
    ".automount",
    ".target",
    ".path",
    ".slice",
    ".swap",
    ".device",
];

/// Validate fragment content and produce the mergeable config value.
///
/// Checks structural invariants only — version support, absolute paths,
/// non-empty names/devices, per-kind uniqueness. Graph position plays no
/// part here; a fragment can convert cleanly and still sit in a graph that
/// fails to resolve.
///
/// # Errors
/// Returns the first violated rule as a [`ConversionError`].
pub fn convert(content: &BootConfigContent) -> Result<BootConfig, ConversionError> {
    if !SUPPORTED_VERSIONS.contains(&content.version.as_str()) {
        return Err(ConversionError::UnsupportedVersion(content.version.clone()));
    }

    validate_systemd(content)?;
    validate_storage(content)?;
    validate_passwd(content)?;

    Ok(BootConfig {
        version: content.version.clone(),
        kernel_arguments: content.kernel_arguments.clone(),
        passwd: content.passwd.clone(),
        storage: content.storage.clone(),
        systemd: content.systemd.clone(),
    })
}

fn validate_systemd(content: &BootConfigContent) -> Result<(), ConversionError> {
    let mut seen = BTreeSet::new();
    for unit in &content.systemd.units {
        if unit.name.is_empty() {
            return Err(ConversionError::EmptyName("systemd unit"));
        }
        if !UNIT_SUFFIXES.iter().any(|s| unit.name.ends_with(s)) {
            return Err(ConversionError::InvalidUnitSuffix(unit.name.clone()));
        }
        if !seen.insert(unit.name.as_str()) {
            return Err(ConversionError::Duplicate {
                kind: "systemd unit",
                name: unit.name.clone(),
            });
        }
        for dropin in &unit.dropins {
            if dropin.name.is_empty() {
                return Err(ConversionError::EmptyName("dropin"));
            }
        }
    }
    Ok(())
}

fn validate_storage(content: &BootConfigContent) -> Result<(), ConversionError> {
    for disk in &content.storage.disks {
        if disk.device.is_empty() {
            return Err(ConversionError::EmptyDevice("disk"));
        }
    }

    let mut paths = BTreeSet::new();
    for file in &content.storage.files {
        if !file.path.starts_with('/') {
            return Err(ConversionError::RelativePath(file.path.clone()));
        }
        if !paths.insert(file.path.as_str()) {
            return Err(ConversionError::Duplicate {
                kind: "file",
                name: file.path.clone(),
            });
        }
    }

    for fs in &content.storage.filesystems {
        if fs.device.is_empty() {
            return Err(ConversionError::EmptyDevice("filesystem"));
        }
        if let Some(path) = &fs.path {
            if !path.starts_with('/') {
                return Err(ConversionError::RelativePath(path.clone()));
            }
        }
    }
    Ok(())
}

fn validate_passwd(content: &BootConfigContent) -> Result<(), ConversionError> {
    let mut users = BTreeSet::new();
    for user in &content.passwd.users {
        if user.name.is_empty() {
            return Err(ConversionError::EmptyName("user"));
        }
        if !users.insert(user.name.as_str()) {
            return Err(ConversionError::Duplicate {
                kind: "user",
                name: user.name.clone(),
            });
        }
    }
    for group in &content.passwd.groups {
        if group.name.is_empty() {
            return Err(ConversionError::EmptyName("group"));
        }
    }
    Ok(())
}
