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

//! Provides the primitive types shared by every stage of the import pipeline.
//!
//! The key components are:
//! - [`AssetUUID`]: the stable 128-bit key of a logical asset.
//! - The [`shard`] scheme that maps an identifier to a two-level cache path.
//! - The [`AssetIdRegistry`] contract through which callers resolve a source
//!   path to its identifier.
//! - [`PixelFormat`]: the block-compressed formats produced by the texture importer.

mod format;
mod id;
mod registry;
pub mod shard;

pub use format::*;
pub use id::*;
pub use registry::*;
