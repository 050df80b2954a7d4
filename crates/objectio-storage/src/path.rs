//! Content-addressed directory paths for an object's shard set.

use objectio_common::ObjectPath;
use std::path::{Path, PathBuf};

/// Resolves the on-disk directory for `object_path` under `disk_root`:
/// `<disk_root>/<hh>/<16hex>/`.
#[must_use]
pub fn object_dir(disk_root: &Path, object_path: &ObjectPath) -> PathBuf {
    disk_root.join(object_path.relative_dir())
}

/// The path to a data/parity shard file, `part.<1-based-index>`.
#[must_use]
pub fn shard_path(disk_root: &Path, object_path: &ObjectPath, index: usize) -> PathBuf {
    object_dir(disk_root, object_path).join(format!("part.{}", index + 1))
}

/// The path to the `xl.meta` descriptor.
#[must_use]
pub fn meta_path(disk_root: &Path, object_path: &ObjectPath) -> PathBuf {
    object_dir(disk_root, object_path).join("xl.meta")
}
