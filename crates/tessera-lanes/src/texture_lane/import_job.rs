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

use super::sizing::TextureSizes;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tessera_core::asset::{AssetUUID, PixelFormat};
use tessera_core::codec::{BlockCompressor, CompressionMode, DecodedImage, ImageDecoder};
use tessera_core::error::ImportError;
use tessera_core::gpu::{CompressedImage, GpuContext, PublishedTexture, ResourcePublisher, TextureId};
use tessera_core::job::{Job, JobResult};
use tessera_io::cache::{hash_bytes, CacheLayout};
use tessera_io::{ImportStamp, MetadataStore, TextureMetadataRecord};

/// Name recorded in import stamps produced by this lane.
pub const TEXTURE_PROCESSOR_NAME: &str = "texture";

/// The collaborators shared by every texture import job.
#[derive(Clone)]
pub struct TexturePipeline {
    /// Turns source files into RGBA8 pixels.
    pub decoder: Arc<dyn ImageDecoder>,
    /// Turns RGBA8 pixels into BC1/BC3 blocks.
    pub compressor: Arc<dyn BlockCompressor>,
    /// Where finished records go.
    pub store: MetadataStore,
    /// Where finished GPU textures go.
    pub publisher: ResourcePublisher,
}

/// Imports one texture source. Runs on the worker thread that owns the GPU.
///
/// The job walks through decode, format selection, size computation,
/// level-0 compression, mip generation and readback, persistence and
/// publication. The first failing step ends the job with its error; a GPU
/// texture created before the failure is released, and a failure after the
/// cache was written removes the record and the stamp again.
pub struct TextureImportJob {
    source: PathBuf,
    id: AssetUUID,
    pipeline: TexturePipeline,
}

/// A decoded source together with the hash of the exact bytes decoded.
struct DecodedSource {
    image: DecodedImage,
    hash: String,
}

/// A compressed mip chain read back from the GPU.
struct MipChain {
    level_count: u32,
    data: Vec<u8>,
}

impl TextureImportJob {
    /// Creates the job importing `source` as asset `id`.
    pub fn new(source: impl Into<PathBuf>, id: AssetUUID, pipeline: TexturePipeline) -> Self {
        Self {
            source: source.into(),
            id,
            pipeline,
        }
    }

    /// The source file.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The asset being imported.
    pub fn id(&self) -> AssetUUID {
        self.id
    }

    fn decode(&self) -> Result<DecodedSource, ImportError> {
        let bytes = fs::read(&self.source).map_err(|e| ImportError::decode(&self.source, e))?;
        let hash = hash_bytes(&bytes);
        let image = self
            .pipeline
            .decoder
            .decode(&bytes)
            .map_err(|e| ImportError::decode(&self.source, e))?;

        if image.width == 0 || image.height == 0 {
            return Err(ImportError::decode(
                &self.source,
                format!("image has no pixels ({}x{})", image.width, image.height),
            ));
        }
        if image.rgba.len() != image.raw_size() {
            return Err(ImportError::decode(
                &self.source,
                format!(
                    "decoder returned {} bytes for a {}x{} RGBA image, expected {}",
                    image.rgba.len(),
                    image.width,
                    image.height,
                    image.raw_size()
                ),
            ));
        }
        Ok(DecodedSource { image, hash })
    }

    fn compress(&self, image: &DecodedImage, sizes: &TextureSizes) -> Result<Vec<u8>, ImportError> {
        let mode = CompressionMode::high_quality(sizes.format);
        let compressor = &self.pipeline.compressor;
        let mismatch = |actual: usize| ImportError::CodecSizeMismatch {
            format: sizes.format,
            width: sizes.width,
            height: sizes.height,
            expected: sizes.level0_size,
            actual,
        };

        let reported = compressor.storage_size(sizes.width, sizes.height, mode);
        if reported != sizes.level0_size {
            return Err(mismatch(reported));
        }

        let level0 = compressor.compress(&image.rgba, sizes.width, sizes.height, mode);
        if level0.len() != sizes.level0_size {
            return Err(mismatch(level0.len()));
        }
        Ok(level0)
    }

    fn read_back<G: GpuContext>(
        gpu: &mut G,
        texture: TextureId,
        sizes: &TextureSizes,
    ) -> Result<MipChain, ImportError> {
        gpu.generate_mipmaps(texture)
            .map_err(|e| ImportError::readback(format!("mipmap generation failed: {e}")))?;

        let level_count = gpu
            .level_count(texture)
            .map_err(|e| ImportError::readback(format!("level count query failed: {e}")))?;
        if level_count == 0 {
            return Err(ImportError::readback("texture reports no mip levels"));
        }

        let mut level_sizes = Vec::with_capacity(level_count as usize);
        for level in 0..level_count {
            let size = gpu
                .level_size(texture, level)
                .map_err(|e| ImportError::readback(format!("level {level} size query failed: {e}")))?;
            if size == 0 {
                return Err(ImportError::readback(format!("level {level} is empty")));
            }
            if level == 0 && size != sizes.level0_size {
                return Err(ImportError::readback(format!(
                    "level 0 holds {size} bytes, expected {}",
                    sizes.level0_size
                )));
            }
            level_sizes.push(size);
        }

        let mut data = vec![0u8; level_sizes.iter().sum()];
        let mut offset = 0;
        for (level, size) in (0..level_count).zip(level_sizes) {
            gpu.read_level(texture, level, &mut data[offset..offset + size])
                .map_err(|e| ImportError::readback(format!("level {level} readback failed: {e}")))?;
            offset += size;
        }

        Ok(MipChain { level_count, data })
    }

    /// Writes the record, then the stamp.
    fn persist(&self, record: &TextureMetadataRecord, source_hash: &str) -> Result<(), ImportError> {
        let legacy = CacheLayout::legacy_sibling_path(&self.source);
        if legacy.is_file() {
            log::warn!(
                "Ignoring legacy metadata file '{}'; the shard cache is authoritative",
                legacy.display()
            );
        }

        let store = &self.pipeline.store;
        store.save_texture(&self.id, record)?;
        store.save_stamp(&ImportStamp::new(
            self.id,
            self.source.to_string_lossy(),
            TEXTURE_PROCESSOR_NAME,
            source_hash,
        ))?;
        Ok(())
    }

    /// Removes whatever `persist` wrote. Runs only on a failed job.
    fn discard_cached(&self) {
        match self.pipeline.store.remove(&self.id) {
            Ok(true) => log::debug!("Discarded cached artifacts of {}", self.id),
            Ok(false) => {}
            Err(e) => log::error!("Could not discard cached artifacts of {}: {e}", self.id),
        }
    }

    /// Everything that happens once the texture exists on the GPU.
    fn finish<G: GpuContext>(
        &self,
        gpu: &mut G,
        texture: TextureId,
        sizes: &TextureSizes,
        source_hash: &str,
    ) -> Result<(), ImportError> {
        let chain = Self::read_back(gpu, texture, sizes)?;
        let level_count = chain.level_count;
        let record = TextureMetadataRecord::new(
            sizes.width,
            sizes.height,
            level_count,
            sizes.format,
            chain.data,
        )?;

        // From here on the cache may hold this job's files.
        let stored = self.persist(&record, source_hash).and_then(|()| {
            self.pipeline.publisher.publish(PublishedTexture {
                asset: self.id,
                texture,
                format: sizes.format,
                width: sizes.width,
                height: sizes.height,
                level_count,
            })
        });
        if stored.is_err() {
            self.discard_cached();
        }
        stored
    }
}

impl<G: GpuContext> Job<G> for TextureImportJob {
    fn label(&self) -> String {
        format!("import texture '{}'", self.source.display())
    }

    fn execute(self: Box<Self>, gpu: &mut G) -> JobResult {
        log::debug!("Importing '{}' as {}", self.source.display(), self.id);

        let DecodedSource { image, hash } = self.decode()?;
        let format = PixelFormat::for_alpha(image.has_alpha);
        let sizes = TextureSizes::compute(image.width, image.height, format);
        let level0 = self.compress(&image, &sizes)?;
        drop(image);

        let texture = gpu
            .upload(CompressedImage {
                width: sizes.width,
                height: sizes.height,
                format,
                data: &level0,
            })
            .map_err(|e| ImportError::readback(format!("level 0 upload failed: {e}")))?;

        if let Err(e) = self.finish(gpu, texture, &sizes, &hash) {
            gpu.release(texture);
            return Err(e);
        }

        log::info!(
            "Imported '{}' as {} ({}x{} {format})",
            self.source.display(),
            self.id,
            sizes.width,
            sizes.height
        );
        Ok(())
    }
}
