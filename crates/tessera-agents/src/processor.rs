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

//! Import strategies and the extension table that selects them.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tessera_core::asset::AssetUUID;
use tessera_core::gpu::GpuContext;
use tessera_core::job::{JobQueue, JobTicket};
use tessera_lanes::texture_lane::{TextureImportJob, TexturePipeline, TEXTURE_PROCESSOR_NAME};

/// Extensions routed to the texture processor by [`ProcessorRegistry::with_defaults`].
pub const DEFAULT_TEXTURE_EXTENSIONS: &[&str] = &[".jpg", ".tif"];

/// Additional image extensions the `image` crate decodes.
pub const COMMON_IMAGE_EXTENSIONS: &[&str] = &[".jpeg", ".tiff", ".png", ".tga", ".bmp"];

/// A strategy that turns one kind of source file into a deferred job.
///
/// `C` is the context the produced jobs execute against.
pub trait ImportProcessor<C>: Send + Sync {
    /// A short name, recorded in import stamps.
    fn name(&self) -> &str;

    /// Builds the job importing `source` as `id` and enqueues it.
    ///
    /// Returns immediately; the work happens on the next drain.
    fn start(&self, source: &Path, id: AssetUUID) -> JobTicket;
}

/// Imports image files as block-compressed, mip-mapped textures.
pub struct TextureProcessor<G> {
    queue: JobQueue<G>,
    pipeline: TexturePipeline,
}

impl<G> TextureProcessor<G> {
    /// Creates a processor enqueuing onto `queue`.
    pub fn new(queue: JobQueue<G>, pipeline: TexturePipeline) -> Self {
        Self { queue, pipeline }
    }
}

impl<G: GpuContext + 'static> ImportProcessor<G> for TextureProcessor<G> {
    fn name(&self) -> &str {
        TEXTURE_PROCESSOR_NAME
    }

    fn start(&self, source: &Path, id: AssetUUID) -> JobTicket {
        let job = TextureImportJob::new(source, id, self.pipeline.clone());
        let ticket = self.queue.enqueue(Box::new(job));
        log::debug!("Queued texture import of '{}' as {}", source.display(), ticket.id());
        ticket
    }
}

/// Normalizes an extension to its lowercase, dot-prefixed form.
///
/// `"JPG"`, `".JPG"` and `".jpg"` all become `".jpg"`.
pub fn normalize_extension(extension: &str) -> String {
    format!(".{}", extension.trim_start_matches('.').to_ascii_lowercase())
}

/// Maps file extensions to the processor that imports them.
///
/// Lookups are case-insensitive. At most one processor is registered per
/// extension; registering again replaces the previous one.
pub struct ProcessorRegistry<C> {
    processors: HashMap<String, Arc<dyn ImportProcessor<C>>>,
}

impl<C> Default for ProcessorRegistry<C> {
    fn default() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }
}

impl<C> ProcessorRegistry<C> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the built-in table: `.jpg` and `.tif` go to `texture`.
    pub fn with_defaults(texture: Arc<dyn ImportProcessor<C>>) -> Self {
        let mut registry = Self::new();
        for extension in DEFAULT_TEXTURE_EXTENSIONS {
            registry.register(extension, texture.clone());
        }
        registry
    }

    /// Routes every extension in [`COMMON_IMAGE_EXTENSIONS`] to `texture`.
    pub fn register_common_image_extensions(&mut self, texture: Arc<dyn ImportProcessor<C>>) {
        for extension in COMMON_IMAGE_EXTENSIONS {
            self.register(extension, texture.clone());
        }
    }

    /// Registers `processor` for `extension`, returning the processor it replaces.
    pub fn register(
        &mut self,
        extension: &str,
        processor: Arc<dyn ImportProcessor<C>>,
    ) -> Option<Arc<dyn ImportProcessor<C>>> {
        let key = normalize_extension(extension);
        let name = processor.name().to_string();
        let previous = self.processors.insert(key.clone(), processor);
        match &previous {
            Some(old) => log::warn!(
                "Processor for '{key}' replaced: '{}' -> '{name}'",
                old.name()
            ),
            None => log::debug!("Registered processor '{name}' for '{key}'"),
        }
        previous
    }

    /// Returns the processor registered for `extension`, in any case, with or
    /// without its leading dot.
    pub fn resolve_extension(&self, extension: &str) -> Option<Arc<dyn ImportProcessor<C>>> {
        self.processors
            .get(&normalize_extension(extension))
            .cloned()
    }

    /// Returns the processor for the extension of `path`.
    ///
    /// Paths without a (UTF-8) extension never match.
    pub fn resolve(&self, path: &Path) -> Option<Arc<dyn ImportProcessor<C>>> {
        let extension = path.extension()?.to_str()?;
        self.resolve_extension(extension)
    }

    /// Every registered extension, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.processors.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        extensions
    }

    /// Returns the number of registered extensions.
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::job::FnJob;

    /// Enqueues a no-op job tagged with its own name.
    struct Tagging {
        name: &'static str,
        queue: JobQueue<Vec<String>>,
    }

    impl ImportProcessor<Vec<String>> for Tagging {
        fn name(&self) -> &str {
            self.name
        }

        fn start(&self, source: &Path, _id: AssetUUID) -> JobTicket {
            let entry = format!("{}:{}", self.name, source.display());
            self.queue.enqueue(FnJob::boxed("tag", move |ctx: &mut Vec<String>| {
                ctx.push(entry);
                Ok(())
            }))
        }
    }

    fn tagging(name: &'static str, queue: &JobQueue<Vec<String>>) -> Arc<dyn ImportProcessor<Vec<String>>> {
        Arc::new(Tagging {
            name,
            queue: queue.clone(),
        })
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let queue = JobQueue::new();
        let registry = ProcessorRegistry::with_defaults(tagging("texture", &queue));

        for extension in [".jpg", ".JPG", "jpg", ".Jpg", ".TIF", "tif"] {
            let processor = registry.resolve_extension(extension);
            assert_eq!(processor.map(|p| p.name().to_string()).as_deref(), Some("texture"));
        }
        assert!(registry.resolve_extension(".png").is_none());
        assert!(registry.resolve(Path::new("Assets/Rock.JPG")).is_some());
        assert!(registry.resolve(Path::new("Assets/README")).is_none());
    }

    #[test]
    fn defaults_are_exactly_jpg_and_tif() {
        let queue = JobQueue::new();
        let registry = ProcessorRegistry::with_defaults(tagging("texture", &queue));
        assert_eq!(registry.extensions(), vec![".jpg", ".tif"]);
    }

    #[test]
    fn common_extensions_are_opt_in() {
        let queue = JobQueue::new();
        let texture = tagging("texture", &queue);
        let mut registry = ProcessorRegistry::with_defaults(texture.clone());
        registry.register_common_image_extensions(texture);

        assert_eq!(registry.len(), 7);
        assert!(registry.resolve(Path::new("ui/icon.PNG")).is_some());
    }

    #[test]
    fn registering_again_replaces() {
        let queue = JobQueue::new();
        let mut registry = ProcessorRegistry::new();
        assert!(registry.register(".jpg", tagging("first", &queue)).is_none());

        let previous = registry.register("JPG", tagging("second", &queue));
        assert_eq!(previous.map(|p| p.name().to_string()).as_deref(), Some("first"));
        assert_eq!(registry.len(), 1);

        let processor = registry.resolve_extension(".jpg").unwrap();
        assert_eq!(processor.name(), "second");
    }

    #[test]
    fn started_processor_enqueues_its_job() {
        let queue = JobQueue::new();
        let registry = ProcessorRegistry::with_defaults(tagging("texture", &queue));

        let processor = registry.resolve(Path::new("a.tif")).unwrap();
        let ticket = processor.start(Path::new("a.tif"), AssetUUID::new());
        assert_eq!(queue.len(), 1);

        let mut log = Vec::new();
        queue.drain(&mut log);
        assert_eq!(log, vec!["texture:a.tif".to_string()]);
        assert!(ticket.wait().unwrap().is_success());
    }
}
