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

use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge length, in pixels, of the square blocks block-compressed formats work on.
pub const BLOCK_DIMENSION: u32 = 4;

/// The block-compressed pixel formats the texture importer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// BC1 (DXT1): opaque color, 8 bytes per 4×4 block.
    Bc1Rgb,
    /// BC3 (DXT5): color plus interpolated alpha, 16 bytes per 4×4 block.
    Bc3Rgba,
}

impl PixelFormat {
    /// Picks the format for an image: BC3 when it carries alpha, BC1 otherwise.
    pub fn for_alpha(has_alpha: bool) -> Self {
        if has_alpha {
            PixelFormat::Bc3Rgba
        } else {
            PixelFormat::Bc1Rgb
        }
    }

    /// Size in bytes of one compressed 4×4 block.
    pub fn bytes_per_block(&self) -> usize {
        match self {
            PixelFormat::Bc1Rgb => 8,
            PixelFormat::Bc3Rgba => 16,
        }
    }

    /// Returns `true` if the format stores an alpha channel.
    pub fn has_alpha(&self) -> bool {
        matches!(self, PixelFormat::Bc3Rgba)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::Bc1Rgb => write!(f, "BC1_RGB"),
            PixelFormat::Bc3Rgba => write!(f, "BC3_RGBA"),
        }
    }
}
