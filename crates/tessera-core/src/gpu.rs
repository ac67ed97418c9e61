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

//! The GPU side of the import pipeline.
//!
//! [`GpuContext`] is the capability owned by the worker thread: it uploads a
//! compressed level-0 image, generates the mip chain and reads every level
//! back. Finished textures travel to the render thread through a bounded
//! channel created by [`resource_channel`].

use crate::asset::{AssetUUID, PixelFormat};
use crate::error::ImportError;
use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use std::error::Error;
use std::time::Duration;

/// An opaque handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// A block-compressed level-0 image ready for upload.
#[derive(Debug, Clone, Copy)]
pub struct CompressedImage<'a> {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Block format of `data`.
    pub format: PixelFormat,
    /// Compressed blocks, row-major.
    pub data: &'a [u8],
}

/// Result type of every GPU operation. Errors must be thread-safe.
pub type GpuResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// The GPU context and mipmap generator, bound to the worker thread.
///
/// The context is not required to be `Send`: it is created on the worker
/// thread and never leaves it. Only [`TextureId`]s cross thread boundaries.
pub trait GpuContext {
    /// Uploads a compressed level-0 image and returns the new texture.
    fn upload(&mut self, image: CompressedImage<'_>) -> GpuResult<TextureId>;

    /// Generates the full mip chain of `texture` from its level 0.
    fn generate_mipmaps(&mut self, texture: TextureId) -> GpuResult<()>;

    /// Returns how many mip levels `texture` has, level 0 included.
    fn level_count(&self, texture: TextureId) -> GpuResult<u32>;

    /// Returns the compressed byte size of `level`.
    fn level_size(&self, texture: TextureId, level: u32) -> GpuResult<usize>;

    /// Copies the compressed bytes of `level` into `out`, whose length equals
    /// [`level_size`](Self::level_size).
    fn read_level(&self, texture: TextureId, level: u32, out: &mut [u8]) -> GpuResult<()>;

    /// Frees `texture`. Called when an import fails after the upload.
    fn release(&mut self, texture: TextureId);
}

/// A texture finished by the worker thread, ready for the render thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedTexture {
    /// The asset the texture was imported from.
    pub asset: AssetUUID,
    /// The GPU handle.
    pub texture: TextureId,
    /// The block format of every level.
    pub format: PixelFormat,
    /// Level-0 width in pixels.
    pub width: u32,
    /// Level-0 height in pixels.
    pub height: u32,
    /// Number of mip levels.
    pub level_count: u32,
}

/// Creates the bounded hand-off channel between the worker and the render thread.
pub fn resource_channel(capacity: usize, send_timeout: Duration) -> (ResourcePublisher, ResourceInbox) {
    let (sender, receiver) = crossbeam_channel::bounded(capacity);
    log::debug!("GPU resource channel created (capacity={capacity})");
    (
        ResourcePublisher {
            sender,
            send_timeout,
        },
        ResourceInbox { receiver },
    )
}

/// The worker-side end of the resource channel.
#[derive(Debug, Clone)]
pub struct ResourcePublisher {
    sender: Sender<PublishedTexture>,
    send_timeout: Duration,
}

impl ResourcePublisher {
    /// Hands `texture` to the render thread.
    ///
    /// Blocks for at most the configured timeout while the channel is full.
    ///
    /// # Errors
    /// Returns [`ImportError::PublishFailure`] if the render side is gone or
    /// the channel stays full past the timeout.
    pub fn publish(&self, texture: PublishedTexture) -> Result<(), ImportError> {
        log::trace!("Publishing texture {:?} for asset {}", texture.texture, texture.asset);
        match self.sender.send_timeout(texture, self.send_timeout) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(t)) => Err(ImportError::PublishFailure {
                reason: format!(
                    "render thread did not accept texture for {} within {:?}",
                    t.asset, self.send_timeout
                ),
            }),
            Err(SendTimeoutError::Disconnected(t)) => Err(ImportError::PublishFailure {
                reason: format!("render thread disconnected before receiving {}", t.asset),
            }),
        }
    }
}

/// The render-side end of the resource channel.
#[derive(Debug)]
pub struct ResourceInbox {
    receiver: Receiver<PublishedTexture>,
}

impl ResourceInbox {
    /// Takes every texture published so far without blocking.
    pub fn drain_ready(&self) -> Vec<PublishedTexture> {
        self.receiver.try_iter().collect()
    }

    /// Waits up to `timeout` for the next published texture.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<PublishedTexture> {
        match self.receiver.recv_timeout(timeout) {
            Ok(texture) => Some(texture),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Returns the number of textures waiting to be taken.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportErrorKind;

    fn texture(n: usize) -> PublishedTexture {
        PublishedTexture {
            asset: AssetUUID::new(),
            texture: TextureId(n),
            format: PixelFormat::Bc1Rgb,
            width: 4,
            height: 4,
            level_count: 3,
        }
    }

    #[test]
    fn published_textures_arrive_in_order() {
        let (publisher, inbox) = resource_channel(4, Duration::from_millis(10));
        publisher.publish(texture(1)).unwrap();
        publisher.publish(texture(2)).unwrap();

        let received = inbox.drain_ready();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].texture, TextureId(1));
        assert_eq!(received[1].texture, TextureId(2));
        assert!(inbox.is_empty());
    }

    #[test]
    fn full_channel_times_out() {
        let (publisher, _inbox) = resource_channel(1, Duration::from_millis(5));
        publisher.publish(texture(1)).unwrap();

        let err = publisher.publish(texture(2)).unwrap_err();
        assert_eq!(err.kind(), ImportErrorKind::PublishFailure);
    }

    #[test]
    fn dropped_inbox_is_reported() {
        let (publisher, inbox) = resource_channel(1, Duration::from_millis(5));
        drop(inbox);

        let err = publisher.publish(texture(1)).unwrap_err();
        assert_eq!(err.kind(), ImportErrorKind::PublishFailure);
    }

    #[test]
    fn publish_from_worker_thread() {
        let (publisher, inbox) = resource_channel(2, Duration::from_secs(1));
        let handle = std::thread::spawn(move || publisher.publish(texture(7)));

        let received = inbox.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(received.texture, TextureId(7));
        handle.join().unwrap().unwrap();
    }
}
