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

use anyhow::Result;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tessera_agents::{ImportConfig, ImportRequest, ImportService, SkipReason};
use tessera_core::asset::{AssetIdRegistry, PathIdRegistry, PixelFormat};
use tessera_core::codec::{BlockCompressor, CompressionMode};
use tessera_core::error::ImportErrorKind;
use tessera_core::gpu::{CompressedImage, GpuContext, GpuResult, TextureId};
use tessera_io::{CacheLayout, MetadataStore};
use tessera_lanes::texture_lane::{compressed_size, ImageCrateDecoder};

const WAIT: Duration = Duration::from_secs(10);

// --- Test doubles: compression and GPU are external to the pipeline ---

struct ZeroCompressor;

impl BlockCompressor for ZeroCompressor {
    fn compress(&self, _rgba: &[u8], width: u32, height: u32, mode: CompressionMode) -> Vec<u8> {
        vec![0; compressed_size(width, height, mode.format)]
    }

    fn storage_size(&self, width: u32, height: u32, mode: CompressionMode) -> usize {
        compressed_size(width, height, mode.format)
    }
}

/// Keeps only level sizes; `read_level` fills with the level index.
#[derive(Default)]
struct SizeOnlyGpu {
    next_id: usize,
    levels: HashMap<usize, Vec<usize>>,
    dims: HashMap<usize, (u32, u32, PixelFormat)>,
}

impl GpuContext for SizeOnlyGpu {
    fn upload(&mut self, image: CompressedImage<'_>) -> GpuResult<TextureId> {
        self.next_id += 1;
        self.levels.insert(self.next_id, vec![image.data.len()]);
        self.dims
            .insert(self.next_id, (image.width, image.height, image.format));
        Ok(TextureId(self.next_id))
    }

    fn generate_mipmaps(&mut self, texture: TextureId) -> GpuResult<()> {
        let (mut w, mut h, format) = *self.dims.get(&texture.0).ok_or("unknown texture")?;
        let levels = self.levels.get_mut(&texture.0).ok_or("unknown texture")?;
        while w > 1 || h > 1 {
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            levels.push(compressed_size(w, h, format));
        }
        Ok(())
    }

    fn level_count(&self, texture: TextureId) -> GpuResult<u32> {
        Ok(self.levels.get(&texture.0).ok_or("unknown texture")?.len() as u32)
    }

    fn level_size(&self, texture: TextureId, level: u32) -> GpuResult<usize> {
        let levels = self.levels.get(&texture.0).ok_or("unknown texture")?;
        Ok(*levels.get(level as usize).ok_or("no such level")?)
    }

    fn read_level(&self, _texture: TextureId, level: u32, out: &mut [u8]) -> GpuResult<()> {
        out.fill(level as u8);
        Ok(())
    }

    fn release(&mut self, texture: TextureId) {
        self.levels.remove(&texture.0);
        self.dims.remove(&texture.0);
    }
}

fn start_service(
    root: &Path,
    ids: Arc<PathIdRegistry>,
    common_extensions: bool,
) -> Result<ImportService<SizeOnlyGpu>> {
    let config = ImportConfig {
        project_root: root.to_path_buf(),
        tick_interval_ms: 1,
        common_image_extensions: common_extensions,
        ..ImportConfig::default()
    };
    start_with(&config, ids)
}

fn start_with(config: &ImportConfig, ids: Arc<PathIdRegistry>) -> Result<ImportService<SizeOnlyGpu>> {
    tessera_agents::logging::init_with_default("debug");
    ImportService::start(
        config,
        ids,
        Arc::new(ImageCrateDecoder::new()),
        Arc::new(ZeroCompressor),
        || Ok(SizeOnlyGpu::default()),
    )
}

fn wait_success(request: &ImportRequest) {
    let ticket = request.ticket().expect("import should have started");
    let outcome = ticket.wait_timeout(WAIT).expect("job should run");
    assert!(outcome.is_success(), "{:?}", outcome.error());
}

// --- Tests ---

#[test]
fn jpg_import_end_to_end() -> Result<()> {
    let project = tempdir()?;
    let assets = project.path().join("Assets");
    fs::create_dir_all(&assets)?;
    let source = assets.join("Rock.JPG");
    RgbImage::from_pixel(20, 12, Rgb([90, 80, 70])).save_with_format(&source, image::ImageFormat::Jpeg)?;

    let ids = Arc::new(PathIdRegistry::deriving());
    let mut service = start_service(project.path(), ids.clone(), false)?;

    let request = service.import(&source)?;
    wait_success(&request);

    let id = ids.lookup(&source).unwrap();
    let published = service.inbox().recv_timeout(WAIT).expect("texture published");
    assert_eq!(published.asset, id);
    assert_eq!(published.format, PixelFormat::Bc1Rgb);
    // 20x12, 10x6, 5x3, 2x1, 1x1
    assert_eq!(published.level_count, 5);

    let store = MetadataStore::new(CacheLayout::new(project.path()));
    let record = store.load_texture(&id)?;
    assert_eq!((record.width, record.height), (20, 12));
    assert_eq!(record.data_size as usize, 5 * 3 * 8 + 3 * 2 * 8 + 2 * 1 * 8 + 8 + 8);

    let reported = service.reports().recv_timeout(WAIT)?;
    assert!(reported.is_success());

    service.shutdown();
    Ok(())
}

#[test]
fn unchanged_source_is_skipped_until_it_changes() -> Result<()> {
    let project = tempdir()?;
    let source = project.path().join("wall.tif");
    RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])).save(&source)?;

    let ids = Arc::new(PathIdRegistry::deriving());
    let mut service = start_service(project.path(), ids.clone(), false)?;

    wait_success(&service.import(&source)?);

    let id = ids.lookup(&source).unwrap();
    let second = service.import(&source)?;
    assert_eq!(second.skip_reason(), Some(&SkipReason::UpToDate(id)));

    RgbImage::from_pixel(8, 8, Rgb([4, 5, 6])).save(&source)?;
    wait_success(&service.import(&source)?);

    service.shutdown();
    Ok(())
}

#[test]
fn failed_publish_can_be_retried() -> Result<()> {
    let project = tempdir()?;
    let first = project.path().join("first.tif");
    let wall = project.path().join("wall.tif");
    RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])).save(&first)?;
    RgbImage::from_pixel(8, 8, Rgb([7, 8, 9])).save(&wall)?;

    let config = ImportConfig {
        project_root: project.path().to_path_buf(),
        tick_interval_ms: 1,
        publish_capacity: 1,
        publish_timeout_ms: 5,
        ..ImportConfig::default()
    };
    let ids = Arc::new(PathIdRegistry::deriving());
    let mut service = start_with(&config, ids.clone())?;

    // Nobody drains the inbox yet, so the second texture cannot be handed over.
    wait_success(&service.import(&first)?);
    let request = service.import(&wall)?;
    let outcome = request.ticket().unwrap().wait_timeout(WAIT).expect("job should run");
    assert_eq!(
        outcome.error().map(|e| e.kind()),
        Some(ImportErrorKind::PublishFailure)
    );

    let id = ids.lookup(&wall).unwrap();
    let store = MetadataStore::new(CacheLayout::new(project.path()));
    assert!(!store.contains_texture(&id));
    assert!(store.load_stamp(&id)?.is_none());

    assert_eq!(service.inbox().drain_ready().len(), 1);
    let retry = service.import(&wall)?;
    assert!(retry.skip_reason().is_none(), "{:?}", retry.skip_reason());
    wait_success(&retry);
    assert!(store.contains_texture(&id));

    service.shutdown();
    Ok(())
}

#[test]
fn unregistered_and_unknown_sources_are_skipped() -> Result<()> {
    let project = tempdir()?;
    let notes = project.path().join("notes.txt");
    let png = project.path().join("icon.png");
    fs::write(&notes, "hello")?;
    RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0])).save(&png)?;

    let ids = Arc::new(PathIdRegistry::deriving());
    let mut service = start_service(project.path(), ids, false)?;

    assert_eq!(
        service.import(&notes)?.skip_reason(),
        Some(&SkipReason::UnregisteredExtension(".txt".to_string()))
    );
    // `.png` is only routed when the common extensions are enabled.
    assert_eq!(
        service.import(&png)?.skip_reason(),
        Some(&SkipReason::UnregisteredExtension(".png".to_string()))
    );
    service.shutdown();

    let strict_ids = Arc::new(PathIdRegistry::new());
    let mut strict = start_service(project.path(), strict_ids, true)?;
    assert_eq!(
        strict.import(&png)?.skip_reason(),
        Some(&SkipReason::UnknownAsset)
    );
    strict.shutdown();
    Ok(())
}

#[test]
fn directory_import_isolates_the_broken_file() -> Result<()> {
    let project = tempdir()?;
    let assets = project.path().join("Assets");
    fs::create_dir_all(assets.join("ui"))?;
    RgbImage::from_pixel(4, 4, Rgb([1, 1, 1])).save(assets.join("a.png"))?;
    RgbImage::from_pixel(4, 4, Rgb([2, 2, 2])).save(assets.join("b.png"))?;
    fs::write(assets.join("c.jpg"), b"not really a jpeg")?;
    RgbaImage::from_pixel(8, 4, Rgba([3, 3, 3, 100])).save(assets.join("ui").join("d.png"))?;
    RgbImage::from_pixel(4, 8, Rgb([4, 4, 4])).save(assets.join("e.bmp"))?;
    fs::write(assets.join("readme.md"), "# assets")?;

    let ids = Arc::new(PathIdRegistry::deriving());
    let mut service = start_service(project.path(), ids.clone(), true)?;

    let requests = service.importer().import_directory(&assets)?;
    assert_eq!(requests.len(), 6);

    let mut outcomes = HashMap::new();
    for (path, request) in &requests {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        match request {
            Ok(ImportRequest::Started(ticket)) => {
                let outcome = ticket.wait_timeout(WAIT).expect("job should run");
                outcomes.insert(name, outcome.error().map(|e| e.kind()));
            }
            Ok(ImportRequest::Skipped(reason)) => {
                assert_eq!(name, "readme.md", "unexpected skip: {reason}");
            }
            Err(e) => panic!("{name} failed to start: {e}"),
        }
    }

    assert_eq!(outcomes.len(), 5);
    assert_eq!(outcomes["c.jpg"], Some(ImportErrorKind::DecodeFailure));
    for name in ["a.png", "b.png", "d.png", "e.bmp"] {
        assert_eq!(outcomes[name], None, "{name} should import");
    }

    service.shutdown();
    let published = service.inbox().drain_ready();
    assert_eq!(published.len(), 4);
    let translucent = published
        .iter()
        .find(|t| Some(t.asset) == ids.lookup(&assets.join("ui").join("d.png")))
        .expect("d.png published");
    assert_eq!(translucent.format, PixelFormat::Bc3Rgba);
    Ok(())
}
