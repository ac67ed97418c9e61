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

//! The records persisted by the import pipeline.

use crate::conversions::{base64_blob, hex_uuid, ticks};
use crate::error::PersistenceError;
use crate::schema::{FieldDescriptor, FieldKind, Record};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tessera_core::asset::{AssetUUID, PixelFormat};

/// The cached result of importing one texture: every mip level of a
/// block-compressed image, back to back.
///
/// `data` holds levels `0..level_count` in order, and `data_size` always
/// equals `data.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureMetadataRecord {
    /// Level-0 width in pixels.
    pub width: u32,
    /// Level-0 height in pixels.
    pub height: u32,
    /// Number of mip levels stored in `data`.
    pub level_count: u32,
    /// The block format of every level.
    pub pixel_format: PixelFormat,
    /// Total size of `data` in bytes.
    pub data_size: u32,
    /// The concatenated compressed levels.
    #[serde(with = "base64_blob")]
    pub data: Vec<u8>,
}

impl Default for TextureMetadataRecord {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            level_count: 0,
            pixel_format: PixelFormat::Bc1Rgb,
            data_size: 0,
            data: Vec::new(),
        }
    }
}

impl TextureMetadataRecord {
    /// Builds a record from the concatenated level buffer, deriving `data_size`.
    ///
    /// # Errors
    /// Returns [`PersistenceError::Inconsistent`] if the buffer is larger than
    /// a `u32` can describe.
    pub fn new(
        width: u32,
        height: u32,
        level_count: u32,
        pixel_format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, PersistenceError> {
        let data_size = u32::try_from(data.len()).map_err(|_| PersistenceError::Inconsistent {
            type_name: Self::TYPE_NAME,
            detail: format!("{} bytes of level data exceed the u32 range", data.len()),
        })?;
        Ok(Self {
            width,
            height,
            level_count,
            pixel_format,
            data_size,
            data,
        })
    }

    /// Checks the record's own invariants.
    pub fn validate(&self) -> Result<(), PersistenceError> {
        let inconsistent = |detail: String| PersistenceError::Inconsistent {
            type_name: Self::TYPE_NAME,
            detail,
        };

        if self.data_size as usize != self.data.len() {
            return Err(inconsistent(format!(
                "data_size is {} but data holds {} bytes",
                self.data_size,
                self.data.len()
            )));
        }
        if self.level_count == 0 && !self.data.is_empty() {
            return Err(inconsistent("level data present with a level count of 0".into()));
        }
        if self.level_count > 0 && (self.width == 0 || self.height == 0) {
            return Err(inconsistent(format!(
                "{} level(s) stored for a {}x{} image",
                self.level_count, self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Record for TextureMetadataRecord {
    const TYPE_NAME: &'static str = "TextureMetadataRecord";

    fn fields() -> &'static [FieldDescriptor] {
        const FIELDS: &[FieldDescriptor] = &[
            FieldDescriptor::required("width", FieldKind::Unsigned),
            FieldDescriptor::required("height", FieldKind::Unsigned),
            FieldDescriptor::required("level_count", FieldKind::Unsigned),
            FieldDescriptor::required("pixel_format", FieldKind::Enum),
            FieldDescriptor::required("data_size", FieldKind::Unsigned),
            FieldDescriptor::required("data", FieldKind::Base64Blob),
        ];
        FIELDS
    }
}

/// Remembers a successful import so that an unchanged source is not
/// processed again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStamp {
    /// The imported asset.
    #[serde(with = "hex_uuid")]
    pub id: AssetUUID,
    /// The source file, as given to the importer.
    pub source_path: String,
    /// The name of the processor that produced the artifact.
    pub processor: String,
    /// BLAKE3 hex digest of the source bytes at import time.
    pub source_hash: String,
    /// When the import finished.
    #[serde(with = "ticks")]
    pub imported_at: SystemTime,
}

impl Default for ImportStamp {
    fn default() -> Self {
        Self {
            id: AssetUUID::from_u128(0),
            source_path: String::new(),
            processor: String::new(),
            source_hash: String::new(),
            imported_at: UNIX_EPOCH,
        }
    }
}

impl ImportStamp {
    /// Creates a stamp dated now.
    pub fn new(
        id: AssetUUID,
        source_path: impl Into<String>,
        processor: impl Into<String>,
        source_hash: impl Into<String>,
    ) -> Self {
        Self {
            id,
            source_path: source_path.into(),
            processor: processor.into(),
            source_hash: source_hash.into(),
            imported_at: SystemTime::now(),
        }
    }

    /// Returns `true` if the stamp was taken from a source with this hash.
    pub fn matches_hash(&self, source_hash: &str) -> bool {
        self.source_hash == source_hash
    }
}

impl Record for ImportStamp {
    const TYPE_NAME: &'static str = "ImportStamp";

    fn fields() -> &'static [FieldDescriptor] {
        const FIELDS: &[FieldDescriptor] = &[
            FieldDescriptor::required("id", FieldKind::HexId),
            FieldDescriptor::required("source_path", FieldKind::Text),
            FieldDescriptor::required("processor", FieldKind::Text),
            FieldDescriptor::required("source_hash", FieldKind::Text),
            FieldDescriptor::required("imported_at", FieldKind::Ticks),
        ];
        FIELDS
    }
}
