//! Order-sensitive combination of two config values.

use crate::error::MergeError;
use crate::schema::BootConfig;

/// Merge `overlay` into `base`.
///
/// List-valued fields concatenate in fold order. Merging the identity on
/// either side returns the other value unchanged, which makes a
/// left-to-right fold over a sorted match list deterministic.
///
/// # Errors
/// [`MergeError::VersionMismatch`] when both sides carry a version and the
/// versions differ.
pub fn merge(base: BootConfig, overlay: BootConfig) -> Result<BootConfig, MergeError> {
    if base.is_identity() {
        return Ok(overlay);
    }
    if overlay.is_identity() {
        return Ok(base);
    }
    if base.version != overlay.version {
        return Err(MergeError::VersionMismatch {
            base: base.version,
            overlay: overlay.version,
        });
    }

    let mut out = base;

    out.kernel_arguments
        .should_exist
        .extend(overlay.kernel_arguments.should_exist);
    out.kernel_arguments
        .should_not_exist
        .extend(overlay.kernel_arguments.should_not_exist);

    out.passwd.users.extend(overlay.passwd.users);
    out.passwd.groups.extend(overlay.passwd.groups);

    out.storage.disks.extend(overlay.storage.disks);
    out.storage.files.extend(overlay.storage.files);
    out.storage.filesystems.extend(overlay.storage.filesystems);

    out.systemd.units.extend(overlay.systemd.units);

    Ok(out)
}
