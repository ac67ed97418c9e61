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

//! Errors raised by the persistence layer.

use std::io;
use std::path::PathBuf;
use tessera_core::error::ImportError;
use thiserror::Error;

/// An error raised while saving or loading a record.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// A file or directory could not be created, written or read.
    #[error("I/O failure on '{}': {source}", .path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The stored text is valid RON but not the shape of the requested record.
    #[error("'{}' does not hold a {type_name}: {detail}", .path.display())]
    TypeMismatch {
        /// The file that was read.
        path: PathBuf,
        /// The requested record type.
        type_name: &'static str,
        /// Which part of the shape disagreed.
        detail: String,
    },

    /// The stored text is not valid RON.
    #[error("Malformed RON in '{}': {detail}", .path.display())]
    Malformed {
        /// The file that failed to parse.
        path: PathBuf,
        /// The parser's explanation.
        detail: String,
    },

    /// A record violates its own invariants.
    #[error("Inconsistent {type_name}: {detail}")]
    Inconsistent {
        /// The record type.
        type_name: &'static str,
        /// The violated invariant.
        detail: String,
    },

    /// A record could not be rendered as RON.
    #[error("Failed to serialize {type_name}: {detail}")]
    Serialize {
        /// The record type.
        type_name: &'static str,
        /// The serializer's explanation.
        detail: String,
    },
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<PersistenceError> for ImportError {
    fn from(error: PersistenceError) -> Self {
        match error {
            PersistenceError::Io { path, source } => ImportError::io(path, source),
            PersistenceError::TypeMismatch {
                type_name, detail, ..
            }
            | PersistenceError::Inconsistent { type_name, detail }
            | PersistenceError::Serialize { type_name, detail } => ImportError::TypeMismatch {
                type_name: type_name.to_string(),
                detail,
            },
            PersistenceError::Malformed { path, detail } => ImportError::Malformed { path, detail },
        }
    }
}
