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

//! Texture import: decode, block-compress, build the mip chain on the GPU,
//! read it back, cache it and hand the GPU texture to the render thread.

mod decoder;
mod import_job;
mod sizing;

pub use decoder::*;
pub use import_job::*;
pub use sizing::*;
