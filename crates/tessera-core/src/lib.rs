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

//! # Tessera Core
//!
//! Foundational crate containing the identifiers, the deferred job queue, the
//! error vocabulary and the interface contracts of the asset-import pipeline.
//!
//! Everything that touches the disk, a codec or a GPU lives in higher-level
//! crates; this crate only defines what they must agree on.

#![warn(missing_docs)]

pub mod asset;
pub mod codec;
pub mod error;
pub mod gpu;
pub mod job;

pub use error::{ImportError, ImportErrorKind};
