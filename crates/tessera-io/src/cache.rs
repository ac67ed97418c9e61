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

//! The on-disk import cache.
//!
//! Every artifact lives at a shard path derived from its asset identifier:
//!
//! ```text
//! <root>/Library/Metadata/<first-2-hex>/<32-hex>   texture metadata records
//! <root>/Library/Cache/<first-2-hex>/<32-hex>      import stamps
//! ```
//!
//! The shard layout is the only one written. A `<name>.metadata` file next to
//! a source is a leftover of an older layout and is never read.

use crate::error::PersistenceError;
use crate::persistence;
use crate::record::{ImportStamp, TextureMetadataRecord};
use crate::schema::Record;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tessera_core::asset::shard::{ensure_shard_dir, shard_dir, shard_path};
use tessera_core::asset::AssetUUID;

/// Name of the project-level directory holding every derived artifact.
pub const LIBRARY_DIR: &str = "Library";
/// Subdirectory of [`LIBRARY_DIR`] holding texture metadata records.
pub const METADATA_DIR: &str = "Metadata";
/// Subdirectory of [`LIBRARY_DIR`] holding import stamps.
pub const CACHE_DIR: &str = "Cache";
/// Extension of the legacy sibling metadata files.
pub const LEGACY_SIBLING_EXTENSION: &str = "metadata";

/// Computes where the cache stores things for a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    /// Creates the layout of the project at `root`. Nothing is created on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/Library/Metadata`.
    pub fn metadata_root(&self) -> PathBuf {
        self.root.join(LIBRARY_DIR).join(METADATA_DIR)
    }

    /// `<root>/Library/Cache`.
    pub fn cache_root(&self) -> PathBuf {
        self.root.join(LIBRARY_DIR).join(CACHE_DIR)
    }

    /// The shard path of the texture metadata record of `id`.
    pub fn metadata_path(&self, id: &AssetUUID) -> PathBuf {
        shard_path(&self.metadata_root(), id)
    }

    /// The shard path of the import stamp of `id`.
    pub fn cache_path(&self, id: &AssetUUID) -> PathBuf {
        shard_path(&self.cache_root(), id)
    }

    /// The legacy `<dir>/<stem>.metadata` location next to `source`.
    pub fn legacy_sibling_path(source: &Path) -> PathBuf {
        source.with_extension(LEGACY_SIBLING_EXTENSION)
    }
}

/// Computes the BLAKE3 hex digest of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Computes the BLAKE3 hex digest of a file's contents.
pub fn hash_file(path: &Path) -> Result<String, PersistenceError> {
    let bytes = fs::read(path).map_err(|e| PersistenceError::io(path, e))?;
    Ok(hash_bytes(&bytes))
}

/// Reads and writes the records of the import cache.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    layout: CacheLayout,
}

impl MetadataStore {
    /// Creates a store over `layout`.
    pub fn new(layout: CacheLayout) -> Self {
        Self { layout }
    }

    /// The layout this store writes to.
    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// Validates and writes the texture record of `id`, creating its shard
    /// directory if needed. Returns the path written.
    pub fn save_texture(
        &self,
        id: &AssetUUID,
        record: &TextureMetadataRecord,
    ) -> Result<PathBuf, PersistenceError> {
        record.validate()?;
        let path = Self::prepare(&self.layout.metadata_root(), id)?;
        persistence::save(&path, record)?;
        log::info!(
            "Cached {} for {id} ({} levels, {} bytes)",
            TextureMetadataRecord::TYPE_NAME,
            record.level_count,
            record.data_size
        );
        Ok(path)
    }

    /// Reads and validates the texture record of `id`.
    pub fn load_texture(&self, id: &AssetUUID) -> Result<TextureMetadataRecord, PersistenceError> {
        let record: TextureMetadataRecord = persistence::load(&self.layout.metadata_path(id))?;
        record.validate()?;
        Ok(record)
    }

    /// Returns `true` if a texture record exists for `id`.
    pub fn contains_texture(&self, id: &AssetUUID) -> bool {
        self.layout.metadata_path(id).is_file()
    }

    /// Writes the import stamp of `stamp.id`. Returns the path written.
    pub fn save_stamp(&self, stamp: &ImportStamp) -> Result<PathBuf, PersistenceError> {
        let path = Self::prepare(&self.layout.cache_root(), &stamp.id)?;
        persistence::save(&path, stamp)?;
        Ok(path)
    }

    /// Reads the import stamp of `id`, or `None` if the asset was never imported.
    pub fn load_stamp(&self, id: &AssetUUID) -> Result<Option<ImportStamp>, PersistenceError> {
        match persistence::load(&self.layout.cache_path(id)) {
            Ok(stamp) => Ok(Some(stamp)),
            Err(PersistenceError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Deletes the texture record and the import stamp of `id`.
    ///
    /// Missing files are not an error. Both deletions are attempted even if
    /// the first fails. Returns `true` if anything was removed.
    pub fn remove(&self, id: &AssetUUID) -> Result<bool, PersistenceError> {
        let mut removed = false;
        let mut first_error = None;
        for path in [self.layout.metadata_path(id), self.layout.cache_path(id)] {
            match fs::remove_file(&path) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    first_error.get_or_insert(PersistenceError::io(&path, e));
                }
            }
        }
        if removed {
            log::debug!("Removed cached artifacts of {id}");
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(removed),
        }
    }

    fn prepare(root: &Path, id: &AssetUUID) -> Result<PathBuf, PersistenceError> {
        ensure_shard_dir(root, id).map_err(|e| PersistenceError::io(shard_dir(root, id), e))
    }
}
