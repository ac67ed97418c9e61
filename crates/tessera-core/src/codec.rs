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

//! Contracts for the pixel codecs the texture importer drives.
//!
//! Decoding and block compression are black boxes to the pipeline. It only
//! relies on the shapes defined here and on the exact storage-size contract of
//! [`BlockCompressor`].

use crate::asset::PixelFormat;
use std::error::Error;

/// Raw RGBA8 pixels decoded from a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Whether any pixel carries meaningful alpha.
    pub has_alpha: bool,
    /// Tightly packed RGBA8 rows, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    /// Size in bytes of the raw RGBA buffer implied by the dimensions.
    pub fn raw_size(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// A codec that turns the contents of an image file into raw RGBA8 pixels.
///
/// The importer reads the source once and hands the same bytes to the
/// decoder and to the content hash, so a stamp always describes what was
/// decoded.
pub trait ImageDecoder: Send + Sync {
    /// Decodes the full contents of an image file.
    ///
    /// # Returns
    /// The decoded pixels, or a boxed dynamic error describing why the bytes
    /// are unparseable. The error must be thread-safe.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, Box<dyn Error + Send + Sync>>;
}

/// The fitting effort requested from the block compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionQuality {
    /// Single-pass endpoint selection.
    Fast,
    /// Iterative cluster fit. Slower, noticeably better gradients.
    IterativeFit,
}

/// Format plus quality flags handed to the block compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressionMode {
    /// The block format to produce.
    pub format: PixelFormat,
    /// The fitting effort.
    pub quality: CompressionQuality,
}

impl CompressionMode {
    /// The mode used by the importer: the given format with iterative fitting.
    pub fn high_quality(format: PixelFormat) -> Self {
        Self {
            format,
            quality: CompressionQuality::IterativeFit,
        }
    }
}

/// A DXT/S3TC block-compression codec.
///
/// Implementations must honor `compress(..).len() == storage_size(..)` for
/// every input; the importer checks both against its own block formula.
pub trait BlockCompressor: Send + Sync {
    /// Compresses a tightly packed RGBA8 image.
    fn compress(&self, rgba: &[u8], width: u32, height: u32, mode: CompressionMode) -> Vec<u8>;

    /// Returns the number of bytes [`compress`](Self::compress) produces for these dimensions.
    fn storage_size(&self, width: u32, height: u32, mode: CompressionMode) -> usize;
}
