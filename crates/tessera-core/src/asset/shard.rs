// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Two-level sharding of cache entries keyed by [`AssetUUID`].
//!
//! An entry for `0123456789abcdef0123456789abcdef` under `root` lives at
//! `root/01/0123456789abcdef0123456789abcdef`. The first two hex characters
//! keep the fan-out of any single directory bounded.

use super::AssetUUID;
use std::io;
use std::path::{Path, PathBuf};

/// Number of leading hex characters used for the shard directory.
pub const SHARD_PREFIX_LEN: usize = 2;

/// Returns the shard directory of `id` under `root`, without touching the disk.
pub fn shard_dir(root: &Path, id: &AssetUUID) -> PathBuf {
    let hex = id.to_hex();
    root.join(&hex[..SHARD_PREFIX_LEN])
}

/// Returns the full path of the entry for `id` under `root`.
///
/// Pure and total: no I/O is performed and every identifier maps to exactly
/// one path.
pub fn shard_path(root: &Path, id: &AssetUUID) -> PathBuf {
    let hex = id.to_hex();
    root.join(&hex[..SHARD_PREFIX_LEN]).join(hex)
}

/// Creates the shard directory of `id` if needed and returns the entry path.
///
/// A directory that already exists, possibly created concurrently by another
/// writer, is not an error.
pub fn ensure_shard_dir(root: &Path, id: &AssetUUID) -> io::Result<PathBuf> {
    let dir = shard_dir(root, id);
    std::fs::create_dir_all(&dir)?;
    log::trace!("Shard directory ready at {}", dir.display());
    Ok(dir.join(id.to_hex()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_id() -> AssetUUID {
        AssetUUID::from_hex("0123456789abcdef0123456789abcdef").unwrap()
    }

    #[test]
    fn shard_path_splits_on_first_two_hex_chars() {
        let root = Path::new("/project/Library/Metadata");
        let path = shard_path(root, &sample_id());

        assert_eq!(
            path,
            Path::new("/project/Library/Metadata/01/0123456789abcdef0123456789abcdef")
        );
        assert_eq!(path.parent().unwrap().file_name().unwrap(), "01");
        assert_eq!(
            path.file_name().unwrap(),
            "0123456789abcdef0123456789abcdef"
        );
    }

    #[test]
    fn shard_dir_is_parent_of_shard_path() {
        let root = Path::new("cache");
        let id = AssetUUID::new();
        assert_eq!(
            shard_path(root, &id).parent().unwrap(),
            shard_dir(root, &id).as_path()
        );
    }

    #[test]
    fn ensure_shard_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Metadata");
        let id = sample_id();

        let first = ensure_shard_dir(&root, &id).unwrap();
        let second = ensure_shard_dir(&root, &id).unwrap();

        assert_eq!(first, second);
        assert!(shard_dir(&root, &id).is_dir());
    }
}
