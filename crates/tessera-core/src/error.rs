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

//! Defines the error vocabulary of the import pipeline.
//!
//! Every fault is attributed to a single job. Nothing here is retried: a
//! failed import must be triggered again.

use crate::asset::PixelFormat;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// The category of an [`ImportError`], convenient for matching in callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportErrorKind {
    /// No processor is registered for the source's extension.
    UnregisteredExtension,
    /// The source could not be read or decoded.
    DecodeFailure,
    /// The block-compression codec disagrees with the computed storage size.
    CodecSizeMismatch,
    /// The GPU mip chain could not be queried or read back consistently.
    GpuReadbackFailure,
    /// A cache directory or file could not be created, written or read.
    PersistenceIoFailure,
    /// A persisted file does not have the shape of the requested record type.
    TypeMismatch,
    /// A persisted file is not valid structured text.
    Malformed,
    /// The GPU handle could not be handed to the render thread.
    PublishFailure,
    /// The job panicked while executing.
    JobPanicked,
}

impl fmt::Display for ImportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportErrorKind::UnregisteredExtension => "UnregisteredExtension",
            ImportErrorKind::DecodeFailure => "DecodeFailure",
            ImportErrorKind::CodecSizeMismatch => "CodecSizeMismatch",
            ImportErrorKind::GpuReadbackFailure => "GpuReadbackFailure",
            ImportErrorKind::PersistenceIoFailure => "PersistenceIOFailure",
            ImportErrorKind::TypeMismatch => "TypeMismatch",
            ImportErrorKind::Malformed => "Malformed",
            ImportErrorKind::PublishFailure => "PublishFailure",
            ImportErrorKind::JobPanicked => "JobPanicked",
        };
        f.write_str(name)
    }
}

/// An error raised while importing a single asset.
#[derive(Debug, Clone)]
pub enum ImportError {
    /// No processor is registered for the extension.
    UnregisteredExtension {
        /// The normalized extension, including its leading dot.
        extension: String,
    },
    /// The pixel codec could not read or parse the source file.
    DecodeFailure {
        /// The source file.
        path: PathBuf,
        /// The codec's explanation.
        reason: String,
    },
    /// The codec's storage requirement or output length differs from the
    /// block-size formula. This implies a buffer corruption risk and is never
    /// accepted silently.
    CodecSizeMismatch {
        /// The compressed format.
        format: PixelFormat,
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// The size computed from the block formula.
        expected: usize,
        /// The size the codec reported, or produced.
        actual: usize,
    },
    /// The mip chain could not be queried or read back.
    GpuReadbackFailure {
        /// What went wrong.
        reason: String,
    },
    /// An I/O operation on the cache failed.
    PersistenceIo {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: Arc<io::Error>,
    },
    /// The stored data does not match the requested record type.
    TypeMismatch {
        /// The record type that was requested.
        type_name: String,
        /// Which part of the shape disagreed.
        detail: String,
    },
    /// The stored data is not valid structured text.
    Malformed {
        /// The file that failed to parse.
        path: PathBuf,
        /// The parser's explanation.
        detail: String,
    },
    /// The published GPU handle could not reach the render thread.
    PublishFailure {
        /// What went wrong.
        reason: String,
    },
    /// The job panicked; the payload message is preserved when it was a string.
    JobPanicked {
        /// The label of the job that panicked.
        job: String,
        /// The panic message.
        message: String,
    },
}

impl ImportError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ImportErrorKind {
        match self {
            ImportError::UnregisteredExtension { .. } => ImportErrorKind::UnregisteredExtension,
            ImportError::DecodeFailure { .. } => ImportErrorKind::DecodeFailure,
            ImportError::CodecSizeMismatch { .. } => ImportErrorKind::CodecSizeMismatch,
            ImportError::GpuReadbackFailure { .. } => ImportErrorKind::GpuReadbackFailure,
            ImportError::PersistenceIo { .. } => ImportErrorKind::PersistenceIoFailure,
            ImportError::TypeMismatch { .. } => ImportErrorKind::TypeMismatch,
            ImportError::Malformed { .. } => ImportErrorKind::Malformed,
            ImportError::PublishFailure { .. } => ImportErrorKind::PublishFailure,
            ImportError::JobPanicked { .. } => ImportErrorKind::JobPanicked,
        }
    }

    /// Convenience constructor for a decode failure.
    pub fn decode(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        ImportError::DecodeFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Convenience constructor for a GPU readback failure.
    pub fn readback(reason: impl Into<String>) -> Self {
        ImportError::GpuReadbackFailure {
            reason: reason.into(),
        }
    }

    /// Convenience constructor wrapping an I/O error on `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ImportError::PersistenceIo {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::UnregisteredExtension { extension } => {
                write!(f, "No processor registered for extension '{extension}'")
            }
            ImportError::DecodeFailure { path, reason } => {
                write!(f, "Failed to decode '{}': {reason}", path.display())
            }
            ImportError::CodecSizeMismatch {
                format,
                width,
                height,
                expected,
                actual,
            } => write!(
                f,
                "Codec size mismatch for {width}x{height} {format}: expected {expected} bytes, codec gave {actual}"
            ),
            ImportError::GpuReadbackFailure { reason } => {
                write!(f, "GPU mip readback failed: {reason}")
            }
            ImportError::PersistenceIo { path, source } => {
                write!(f, "I/O failure on '{}': {source}", path.display())
            }
            ImportError::TypeMismatch { type_name, detail } => {
                write!(f, "Stored data does not match type '{type_name}': {detail}")
            }
            ImportError::Malformed { path, detail } => {
                write!(f, "Malformed data in '{}': {detail}", path.display())
            }
            ImportError::PublishFailure { reason } => {
                write!(f, "Failed to publish GPU resource: {reason}")
            }
            ImportError::JobPanicked { job, message } => {
                write!(f, "Job '{job}' panicked: {message}")
            }
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::PersistenceIo { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
