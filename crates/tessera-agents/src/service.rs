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

//! Assembly of the whole import pipeline.

use crate::config::ImportConfig;
use crate::importer::{AssetImporter, ImportRequest};
use crate::processor::{ImportProcessor, ProcessorRegistry, TextureProcessor};
use crate::worker::ImportWorker;
use anyhow::Result;
use crossbeam_channel::Receiver;
use std::path::Path;
use std::sync::Arc;
use tessera_core::asset::AssetIdRegistry;
use tessera_core::codec::{BlockCompressor, ImageDecoder};
use tessera_core::error::ImportError;
use tessera_core::gpu::{resource_channel, GpuContext, ResourceInbox};
use tessera_core::job::{JobOutcome, JobQueue};
use tessera_io::{CacheLayout, MetadataStore};
use tessera_lanes::texture_lane::TexturePipeline;

/// A running import pipeline: the worker thread, the importer feeding it, and
/// the receiving ends of its two outputs.
pub struct ImportService<G> {
    // Must stay first: the worker's final drain still publishes to `inbox`.
    worker: ImportWorker<G>,
    importer: AssetImporter<G>,
    inbox: ResourceInbox,
    reports: Receiver<JobOutcome>,
}

impl<G: GpuContext + 'static> ImportService<G> {
    /// Builds the pipeline described by `config` and starts its worker.
    ///
    /// `make_gpu` runs on the worker thread and creates the GPU context there.
    pub fn start<F>(
        config: &ImportConfig,
        ids: Arc<dyn AssetIdRegistry>,
        decoder: Arc<dyn ImageDecoder>,
        compressor: Arc<dyn BlockCompressor>,
        make_gpu: F,
    ) -> Result<Self>
    where
        F: FnOnce() -> Result<G> + Send + 'static,
    {
        let store = MetadataStore::new(CacheLayout::new(&config.project_root));
        let (publisher, inbox) =
            resource_channel(config.publish_capacity, config.publish_timeout());
        let queue = JobQueue::new();

        let texture: Arc<dyn ImportProcessor<G>> = Arc::new(TextureProcessor::new(
            queue.clone(),
            TexturePipeline {
                decoder,
                compressor,
                store: store.clone(),
                publisher,
            },
        ));
        let mut processors = ProcessorRegistry::with_defaults(Arc::clone(&texture));
        if config.common_image_extensions {
            processors.register_common_image_extensions(texture);
        }

        let importer = AssetImporter::new(ids, Arc::new(processors), store)
            .with_force(config.force_reimport);
        let (worker, reports) = ImportWorker::spawn(queue, &config.worker(), make_gpu)?;

        log::info!(
            "Import service started for '{}' (extensions: {})",
            config.project_root.display(),
            importer.processors().extensions().join(", ")
        );

        Ok(Self {
            worker,
            importer,
            inbox,
            reports,
        })
    }
}

impl<G> ImportService<G> {
    /// Starts the import of `source`. See [`AssetImporter::import`].
    pub fn import(&self, source: &Path) -> Result<ImportRequest, ImportError> {
        self.importer.import(source)
    }

    /// The importer feeding the worker.
    pub fn importer(&self) -> &AssetImporter<G> {
        &self.importer
    }

    /// Finished GPU textures, for the render thread.
    pub fn inbox(&self) -> &ResourceInbox {
        &self.inbox
    }

    /// The outcome of every executed job.
    pub fn reports(&self) -> &Receiver<JobOutcome> {
        &self.reports
    }

    /// The queue drained by the worker.
    pub fn queue(&self) -> &JobQueue<G> {
        self.worker.queue()
    }

    /// Runs every queued job and stops the worker thread.
    pub fn shutdown(&mut self) {
        self.worker.shutdown();
    }
}
