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

//! # Tessera IO
//!
//! Persistence services for the import pipeline: RON-backed records with
//! compile-time schemas, the custom field conversions they use, and the
//! sharded on-disk cache that stores them.

#![warn(missing_docs)]

pub mod cache;
pub mod conversions;
pub mod error;
pub mod persistence;
pub mod record;
pub mod schema;

pub use cache::{CacheLayout, MetadataStore};
pub use error::PersistenceError;
pub use record::{ImportStamp, TextureMetadataRecord};
pub use schema::{FieldDescriptor, FieldKind, Record, RecordSchema, SchemaCache, ValueShape};
