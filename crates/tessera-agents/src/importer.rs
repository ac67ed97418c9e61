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

//! The caller-side entry point of the pipeline.

use crate::processor::{normalize_extension, ProcessorRegistry};
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tessera_core::asset::{AssetIdRegistry, AssetUUID};
use tessera_core::error::ImportError;
use tessera_core::job::JobTicket;
use tessera_io::cache::hash_file;
use tessera_io::MetadataStore;
use walkdir::WalkDir;

/// Why a source was not handed to a processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No processor handles this extension (normalized, with its dot).
    UnregisteredExtension(String),
    /// The cache already holds an artifact built from identical source bytes.
    UpToDate(AssetUUID),
    /// The identifier registry does not know the path.
    UnknownAsset,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnregisteredExtension(ext) => write!(f, "no processor for '{ext}'"),
            SkipReason::UpToDate(id) => write!(f, "{id} is up to date"),
            SkipReason::UnknownAsset => write!(f, "unknown asset"),
        }
    }
}

/// What [`AssetImporter::import`] did with a source.
#[derive(Debug)]
pub enum ImportRequest {
    /// A job was enqueued; the ticket reports its outcome.
    Started(JobTicket),
    /// Nothing was enqueued.
    Skipped(SkipReason),
}

impl ImportRequest {
    /// Returns the ticket if a job was started.
    pub fn ticket(&self) -> Option<&JobTicket> {
        match self {
            ImportRequest::Started(ticket) => Some(ticket),
            ImportRequest::Skipped(_) => None,
        }
    }

    /// Returns the reason if nothing was started.
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            ImportRequest::Started(_) => None,
            ImportRequest::Skipped(reason) => Some(reason),
        }
    }
}

/// Resolves sources to identifiers and processors, and starts their imports.
///
/// Safe to share between threads; `import` may be called from anywhere.
pub struct AssetImporter<C> {
    ids: Arc<dyn AssetIdRegistry>,
    processors: Arc<ProcessorRegistry<C>>,
    store: MetadataStore,
    force: bool,
}

impl<C> AssetImporter<C> {
    /// Creates an importer. Sources already imported from identical bytes are skipped.
    pub fn new(
        ids: Arc<dyn AssetIdRegistry>,
        processors: Arc<ProcessorRegistry<C>>,
        store: MetadataStore,
    ) -> Self {
        Self {
            ids,
            processors,
            store,
            force: false,
        }
    }

    /// When `force` is set, every source is imported even if its cache entry is fresh.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// The processor table.
    pub fn processors(&self) -> &ProcessorRegistry<C> {
        &self.processors
    }

    /// Starts the import of `source`.
    ///
    /// # Errors
    /// Only the freshness check can fail, when the source cannot be read for
    /// hashing. Unknown paths and unregistered extensions are skips, not errors.
    pub fn import(&self, source: &Path) -> Result<ImportRequest, ImportError> {
        let Some(id) = self.ids.lookup(source) else {
            log::debug!("No identifier for '{}'", source.display());
            return Ok(ImportRequest::Skipped(SkipReason::UnknownAsset));
        };

        let Some(processor) = self.processors.resolve(source) else {
            let extension = source
                .extension()
                .map(|e| normalize_extension(&e.to_string_lossy()))
                .unwrap_or_default();
            log::debug!("No processor for '{}'", source.display());
            return Ok(ImportRequest::Skipped(SkipReason::UnregisteredExtension(
                extension,
            )));
        };

        if !self.force && self.is_up_to_date(source, &id, processor.name())? {
            log::debug!("'{}' is up to date", source.display());
            return Ok(ImportRequest::Skipped(SkipReason::UpToDate(id)));
        }

        Ok(ImportRequest::Started(processor.start(source, id)))
    }

    /// Starts the import of every file under `dir`, in file-name order.
    ///
    /// Returns each visited file with what was done with it. A file whose
    /// import cannot be started keeps its error and the scan goes on.
    ///
    /// # Errors
    /// Fails only if the directory tree itself cannot be walked.
    pub fn import_directory(
        &self,
        dir: &Path,
    ) -> Result<Vec<(PathBuf, Result<ImportRequest, ImportError>)>> {
        let mut requests = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("Failed to walk directory '{}'", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.into_path();
            let request = self.import(&path);
            if let Err(e) = &request {
                log::error!("Failed to start import of '{}': {e}", path.display());
            }
            requests.push((path, request));
        }

        let started = requests
            .iter()
            .filter(|(_, r)| matches!(r, Ok(ImportRequest::Started(_))))
            .count();
        let failed = requests.iter().filter(|(_, r)| r.is_err()).count();
        log::info!(
            "Scanned '{}': {} file(s), {started} import(s) started, {failed} failed to start",
            dir.display(),
            requests.len()
        );
        Ok(requests)
    }

    fn is_up_to_date(
        &self,
        source: &Path,
        id: &AssetUUID,
        processor: &str,
    ) -> Result<bool, ImportError> {
        if !self.store.contains_texture(id) {
            return Ok(false);
        }
        let stamp = match self.store.load_stamp(id) {
            Ok(Some(stamp)) => stamp,
            Ok(None) => return Ok(false),
            Err(e) => {
                log::warn!("Unreadable import stamp for {id}, reimporting: {e}");
                return Ok(false);
            }
        };
        if stamp.processor != processor {
            return Ok(false);
        }
        Ok(stamp.matches_hash(&hash_file(source)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::ImportProcessor;
    use std::fs;
    use tempfile::tempdir;
    use tessera_core::asset::{PathIdRegistry, PixelFormat};
    use tessera_core::error::ImportErrorKind;
    use tessera_core::job::{FnJob, JobQueue};
    use tessera_io::{CacheLayout, ImportStamp, TextureMetadataRecord};

    struct Counting {
        queue: JobQueue<u32>,
    }

    impl ImportProcessor<u32> for Counting {
        fn name(&self) -> &str {
            "texture"
        }

        fn start(&self, _source: &Path, _id: AssetUUID) -> JobTicket {
            self.queue.enqueue(FnJob::boxed("count", |ctx: &mut u32| {
                *ctx += 1;
                Ok(())
            }))
        }
    }

    /// Deletes one file the moment its identifier is looked up.
    struct Vanishing {
        ids: PathIdRegistry,
        doomed: PathBuf,
    }

    impl AssetIdRegistry for Vanishing {
        fn lookup(&self, path: &Path) -> Option<AssetUUID> {
            if path == self.doomed {
                let _ = fs::remove_file(path);
            }
            self.ids.lookup(path)
        }
    }

    #[test]
    fn unreadable_file_does_not_stop_the_scan() -> Result<()> {
        let project = tempdir()?;
        let assets = project.path().join("Assets");
        fs::create_dir_all(&assets)?;
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            fs::write(assets.join(name), name)?;
        }

        // `b.jpg` was imported before, so its freshness check has to hash it.
        let doomed = assets.join("b.jpg");
        let doomed_id = AssetUUID::new();
        let store = MetadataStore::new(CacheLayout::new(project.path()));
        store.save_texture(
            &doomed_id,
            &TextureMetadataRecord::new(4, 4, 1, PixelFormat::Bc1Rgb, vec![0; 8])?,
        )?;
        store.save_stamp(&ImportStamp::new(doomed_id, "b.jpg", "texture", "stale"))?;

        let ids = PathIdRegistry::deriving();
        ids.insert(doomed.clone(), doomed_id);
        let queue = JobQueue::new();
        let counting: Arc<dyn ImportProcessor<u32>> = Arc::new(Counting {
            queue: queue.clone(),
        });
        let processors = ProcessorRegistry::with_defaults(counting);
        let importer = AssetImporter::new(
            Arc::new(Vanishing { ids, doomed }),
            Arc::new(processors),
            store,
        );

        let requests = importer.import_directory(&assets)?;
        assert_eq!(requests.len(), 3);

        let failure = requests[1].1.as_ref().unwrap_err();
        assert_eq!(failure.kind(), ImportErrorKind::PersistenceIoFailure);
        assert!(matches!(requests[0].1, Ok(ImportRequest::Started(_))));
        assert!(matches!(requests[2].1, Ok(ImportRequest::Started(_))));

        let mut started = 0;
        queue.drain(&mut started);
        assert_eq!(started, 2);
        Ok(())
    }
}
