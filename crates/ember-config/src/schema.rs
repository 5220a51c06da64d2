//! Boot-config schema
//!
//! A slimmed declarative boot-configuration shape: kernel arguments,
//! users/groups, storage and systemd units. Field order is fixed, which is
//! what makes the JSON payload encoding stable.

use serde::{Deserialize, Serialize};

/// User-authored fragment content.
///
/// This is the raw shape as it appears in a fragment spec. It has not been
/// validated; [`crate::convert`] turns it into a [`BootConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootConfigContent {
    /// Config format version, e.g. `"3.5.0"`.
    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "KernelArguments::is_empty")]
    pub kernel_arguments: KernelArguments,

    #[serde(default, skip_serializing_if = "Passwd::is_empty")]
    pub passwd: Passwd,

    #[serde(default, skip_serializing_if = "Storage::is_empty")]
    pub storage: Storage,

    #[serde(default, skip_serializing_if = "Systemd::is_empty")]
    pub systemd: Systemd,
}

/// The opaque, validated, mergeable configuration value.
///
/// Produced only by [`crate::convert`] (from content) or [`crate::merge`]
/// (from two existing values). An empty version marks the merge identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootConfig {
    pub(crate) version: String,

    #[serde(skip_serializing_if = "KernelArguments::is_empty")]
    pub(crate) kernel_arguments: KernelArguments,

    #[serde(skip_serializing_if = "Passwd::is_empty")]
    pub(crate) passwd: Passwd,

    #[serde(skip_serializing_if = "Storage::is_empty")]
    pub(crate) storage: Storage,

    #[serde(skip_serializing_if = "Systemd::is_empty")]
    pub(crate) systemd: Systemd,
}

impl BootConfig {
    /// The merge identity: contributes nothing and adopts the version of
    /// whatever it is merged with.
    #[inline]
    #[must_use]
    pub fn identity() -> Self {
        Self {
            version: String::new(),
            kernel_arguments: KernelArguments::default(),
            passwd: Passwd::default(),
            storage: Storage::default(),
            systemd: Systemd::default(),
        }
    }

    /// Whether this value is the merge identity.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.version.is_empty()
            && self.kernel_arguments.is_empty()
            && self.passwd.is_empty()
            && self.storage.is_empty()
            && self.systemd.is_empty()
    }

    /// Config format version.
    #[inline]
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[inline]
    #[must_use]
    pub fn kernel_arguments(&self) -> &KernelArguments {
        &self.kernel_arguments
    }

    #[inline]
    #[must_use]
    pub fn passwd(&self) -> &Passwd {
        &self.passwd
    }

    #[inline]
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[inline]
    #[must_use]
    pub fn systemd(&self) -> &Systemd {
        &self.systemd
    }
}

/// Kernel arguments that should or should not be present on the kernel
/// command line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KernelArguments {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should_exist: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should_not_exist: Vec<String>,
}

impl KernelArguments {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.should_exist.is_empty() && self.should_not_exist.is_empty()
    }
}

/// Users and groups.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passwd {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<PasswdUser>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<PasswdGroup>,
}

impl Passwd {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswdUser {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ssh_authorized_keys: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswdGroup {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<bool>,
}

/// Disks, files and filesystems.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Storage {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disks: Vec<Disk>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<File>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filesystems: Vec<Filesystem>,
}

impl Storage {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.disks.is_empty() && self.files.is_empty() && self.filesystems.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disk {
    pub device: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<Partition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wipe_table: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    pub number: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_mib: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_exist: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub append: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filesystem {
    pub device: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wipe_filesystem: Option<bool>,
}

/// Systemd units and dropins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Systemd {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<Unit>,
}

impl Systemd {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropins: Vec<Dropin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dropin {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}
