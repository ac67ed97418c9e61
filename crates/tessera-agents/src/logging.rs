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

//! Logging backend setup for applications embedding the importer.
//!
//! Every crate logs through the `log` facade; this only installs
//! `env_logger` as the backend.

use env_logger::{Builder, Env};

/// Installs `env_logger`, honoring `RUST_LOG` and defaulting to `info`.
///
/// Calling it again after a logger is installed has no effect.
pub fn init() {
    init_with_default("info");
}

/// Installs `env_logger`, honoring `RUST_LOG` and defaulting to `filter`.
pub fn init_with_default(filter: &str) {
    if Builder::from_env(Env::default().default_filter_or(filter))
        .try_init()
        .is_err()
    {
        log::debug!("A logger is already installed, keeping it");
    }
}
