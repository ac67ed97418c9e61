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

use anyhow::{Context, Result};
use std::error::Error;
use tessera_core::codec::{DecodedImage, ImageDecoder};

/// Decodes any image format supported by the `image` crate into RGBA8.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    /// Creates a new decoder.
    pub fn new() -> Self {
        Self
    }
}

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, Box<dyn Error + Send + Sync + 'static>> {
        // Decode the image using the `image` crate
        let img = image::load_from_memory(bytes).context("Failed to decode image from memory")?;
        let color_has_alpha = img.color().has_alpha();

        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();
        let rgba = rgba_img.into_raw();

        // An alpha channel that is fully opaque does not need BC3.
        let has_alpha = color_has_alpha && rgba.chunks_exact(4).any(|px| px[3] != u8::MAX);

        log::trace!("Decoded {width}x{height} image, alpha={has_alpha}");
        Ok(DecodedImage {
            width,
            height,
            has_alpha,
            rgba,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(image: impl Into<DynamicImage>) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.into().write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn opaque_png_has_no_alpha() {
        let bytes = png(RgbImage::from_pixel(5, 3, Rgb([10, 20, 30])));

        let decoded = ImageCrateDecoder.decode(&bytes).unwrap();
        assert_eq!((decoded.width, decoded.height), (5, 3));
        assert!(!decoded.has_alpha);
        assert_eq!(decoded.rgba.len(), decoded.raw_size());
        assert_eq!(&decoded.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn translucent_png_has_alpha() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        img.put_pixel(2, 2, Rgba([0, 0, 0, 128]));

        assert!(ImageCrateDecoder.decode(&png(img)).unwrap().has_alpha);
    }

    #[test]
    fn fully_opaque_rgba_png_has_no_alpha() {
        let bytes = png(RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255])));
        assert!(!ImageCrateDecoder.decode(&bytes).unwrap().has_alpha);
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = ImageCrateDecoder
            .decode(b"definitely not a jpeg")
            .unwrap_err();
        assert!(err.to_string().contains("decode"), "{err}");
    }

    #[test]
    fn empty_input_fails_to_decode() {
        assert!(ImageCrateDecoder.decode(&[]).is_err());
    }
}
