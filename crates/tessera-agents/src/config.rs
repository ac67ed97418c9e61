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

//! Configuration of the import service.

use crate::worker::WorkerConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tessera_io::persistence;
use tessera_io::{FieldDescriptor, FieldKind, Record};

/// Configuration for the import service.
///
/// Every field is optional in a configuration file; missing fields keep
/// their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// The project whose `Library` directory receives the cache.
    pub project_root: PathBuf,
    /// Time between two drains of the import queue, in milliseconds.
    pub tick_interval_ms: u64,
    /// Number of finished textures the render thread may leave unclaimed.
    pub publish_capacity: usize,
    /// How long the worker waits for room in a full publish channel.
    pub publish_timeout_ms: u64,
    /// Number of job outcomes buffered for the report receiver.
    pub report_capacity: usize,
    /// Also route `.jpeg`, `.tiff`, `.png`, `.tga` and `.bmp` to the texture processor.
    pub common_image_extensions: bool,
    /// Reimport sources even when their cache entry is up to date.
    pub force_reimport: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            tick_interval_ms: 16,
            publish_capacity: 64,
            publish_timeout_ms: 1000,
            report_capacity: 1024,
            common_image_extensions: false,
            force_reimport: false,
        }
    }
}

impl Record for ImportConfig {
    const TYPE_NAME: &'static str = "ImportConfig";

    fn fields() -> &'static [FieldDescriptor] {
        const FIELDS: &[FieldDescriptor] = &[
            FieldDescriptor::optional("project_root", FieldKind::Text),
            FieldDescriptor::optional("tick_interval_ms", FieldKind::Unsigned),
            FieldDescriptor::optional("publish_capacity", FieldKind::Unsigned),
            FieldDescriptor::optional("publish_timeout_ms", FieldKind::Unsigned),
            FieldDescriptor::optional("report_capacity", FieldKind::Unsigned),
            FieldDescriptor::optional("common_image_extensions", FieldKind::Boolean),
            FieldDescriptor::optional("force_reimport", FieldKind::Boolean),
        ];
        FIELDS
    }
}

impl ImportConfig {
    /// Reads the configuration at `path`, or the defaults if there is no such file.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        persistence::load_or_default(path)
            .with_context(|| format!("Failed to load import configuration '{}'", path.display()))
    }

    /// Writes the configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        persistence::save(path, self)
            .with_context(|| format!("Failed to save import configuration '{}'", path.display()))
    }

    /// The drain interval.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// The publish send timeout.
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    /// The settings of the worker thread.
    pub fn worker(&self) -> WorkerConfig {
        WorkerConfig {
            tick: self.tick(),
            report_capacity: self.report_capacity,
        }
    }
}
