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

//! # Tessera Agents
//!
//! Orchestration of the import pipeline. Callers on any thread hand source
//! paths to an [`AssetImporter`], which resolves the asset identifier, picks
//! an [`ImportProcessor`] by file extension and lets it enqueue a job. An
//! [`ImportWorker`] owns the GPU context on its own thread and drains those
//! jobs; [`ImportService`] wires everything together from an [`ImportConfig`].

#![warn(missing_docs)]

pub mod config;
pub mod importer;
pub mod logging;
pub mod processor;
pub mod service;
pub mod worker;

pub use config::ImportConfig;
pub use importer::{AssetImporter, ImportRequest, SkipReason};
pub use processor::{ImportProcessor, ProcessorRegistry, TextureProcessor};
pub use service::ImportService;
pub use worker::{ImportWorker, WorkerConfig};
