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

use tessera_core::asset::{PixelFormat, BLOCK_DIMENSION};

/// The exact byte sizes involved in compressing one level-0 image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSizes {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// The block format.
    pub format: PixelFormat,
    /// Size of the decoded RGBA8 buffer.
    pub raw_size: usize,
    /// Number of 4x4 blocks across, partial blocks included.
    pub blocks_per_row: u32,
    /// Number of 4x4 blocks down, partial blocks included.
    pub blocks_per_column: u32,
    /// Size of the compressed level 0.
    pub level0_size: usize,
}

impl TextureSizes {
    /// Computes every size for a `width` x `height` image in `format`.
    pub fn compute(width: u32, height: u32, format: PixelFormat) -> Self {
        let blocks_per_row = width.div_ceil(BLOCK_DIMENSION);
        let blocks_per_column = height.div_ceil(BLOCK_DIMENSION);
        Self {
            width,
            height,
            format,
            raw_size: width as usize * height as usize * 4,
            blocks_per_row,
            blocks_per_column,
            level0_size: compressed_size(width, height, format),
        }
    }
}

/// Size in bytes of a `width` x `height` image compressed to `format`.
pub fn compressed_size(width: u32, height: u32, format: PixelFormat) -> usize {
    width.div_ceil(BLOCK_DIMENSION) as usize
        * height.div_ceil(BLOCK_DIMENSION) as usize
        * format.bytes_per_block()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_blocks_round_up() {
        let bc1 = TextureSizes::compute(17, 17, PixelFormat::Bc1Rgb);
        assert_eq!(bc1.blocks_per_row, 5);
        assert_eq!(bc1.blocks_per_column, 5);
        assert_eq!(bc1.raw_size, 17 * 17 * 4);
        assert_eq!(bc1.level0_size, 200);

        let bc3 = TextureSizes::compute(17, 17, PixelFormat::Bc3Rgba);
        assert_eq!(bc3.level0_size, 400);
    }

    #[test]
    fn tiny_images_take_one_block() {
        assert_eq!(compressed_size(1, 1, PixelFormat::Bc1Rgb), 8);
        assert_eq!(compressed_size(2, 3, PixelFormat::Bc3Rgba), 16);
    }

    #[test]
    fn non_square_images() {
        let sizes = TextureSizes::compute(64, 8, PixelFormat::Bc1Rgb);
        assert_eq!(sizes.blocks_per_row, 16);
        assert_eq!(sizes.blocks_per_column, 2);
        assert_eq!(sizes.level0_size, 256);
    }
}
