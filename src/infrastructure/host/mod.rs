//! Real device adapters backed by cpal and nokhwa

pub mod camera;
pub mod enumerator;
pub mod microphone;

pub use enumerator::HostEnumerator;

use async_trait::async_trait;

use crate::application::ports::{AttachError, CaptureHost, FrameSender, InputStream};
use crate::domain::device::{CaptureDevice, MediaKind};

/// Capture host that opens streams on the machine's real devices.
pub struct HostCapture;

impl HostCapture {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HostCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureHost for HostCapture {
    async fn open_stream(
        &self,
        device: &CaptureDevice,
        frames: FrameSender,
    ) -> Result<Box<dyn InputStream>, AttachError> {
        match device.kind {
            MediaKind::Video => camera::open_stream(device, frames).await,
            MediaKind::Audio => microphone::open_stream(device, frames).await,
        }
    }
}
