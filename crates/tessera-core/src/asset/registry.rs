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

//! Resolution of source paths to their stable [`AssetUUID`].

use super::AssetUUID;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// The project's path-to-identifier registry.
///
/// The pipeline only ever consumes this as a lookup; how identifiers are
/// assigned and persisted belongs to the project that owns the sources.
pub trait AssetIdRegistry: Send + Sync {
    /// Returns the identifier of the asset stored at `path`, if it is known.
    fn lookup(&self, path: &Path) -> Option<AssetUUID>;
}

/// An in-memory [`AssetIdRegistry`].
///
/// Entries can be inserted explicitly. When built with
/// [`deriving`](PathIdRegistry::deriving), unknown paths receive a
/// deterministic v5 identifier derived from their path string, which is then
/// remembered so that later lookups are stable even if the derivation changes.
#[derive(Debug, Default)]
pub struct PathIdRegistry {
    entries: RwLock<HashMap<PathBuf, AssetUUID>>,
    derive_missing: bool,
}

impl PathIdRegistry {
    /// Creates a registry that only knows explicitly inserted paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that derives identifiers for unknown paths.
    pub fn deriving() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            derive_missing: true,
        }
    }

    /// Associates `path` with `id`, returning the previous identifier if any.
    pub fn insert(&self, path: impl Into<PathBuf>, id: AssetUUID) -> Option<AssetUUID> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), id)
    }

    /// Returns the number of known paths.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no path is known.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssetIdRegistry for PathIdRegistry {
    fn lookup(&self, path: &Path) -> Option<AssetUUID> {
        if let Some(id) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Some(*id);
        }

        if !self.derive_missing {
            return None;
        }

        let key = path.to_string_lossy().replace('\\', "/");
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let id = *entries
            .entry(path.to_path_buf())
            .or_insert_with(|| AssetUUID::new_v5(&key));
        Some(id)
    }
}
