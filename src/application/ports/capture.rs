//! Capture host port interfaces

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::device::{CaptureDevice, DeviceId};
use crate::domain::frame::Frame;

/// Channel end a stream delivers its frames into
pub type FrameSender = mpsc::Sender<Frame>;

/// Input attach errors
#[derive(Debug, Clone, Error)]
pub enum AttachError {
    #[error("Failed to open stream for device {device}: {reason}")]
    OpenFailed { device: DeviceId, reason: String },

    #[error("Device {0} disappeared between enumeration and attach")]
    DeviceGone(DeviceId),
}

/// A running hardware stream.
///
/// The stream owns the device while it exists; dropping or closing it
/// releases the device. Frames stop arriving once `close` returns.
pub trait InputStream: Send {
    /// Stop delivering frames and release the device.
    fn close(self: Box<Self>);
}

/// Port for opening device streams.
#[async_trait]
pub trait CaptureHost: Send + Sync {
    /// Open a stream on the given device.
    ///
    /// The stream pushes frames into `frames` as they are captured.
    /// Streams must not block on a full channel; excess frames are dropped.
    ///
    /// # Returns
    /// A handle that keeps the stream alive, or an `AttachError` when the
    /// device exists but cannot be opened.
    async fn open_stream(
        &self,
        device: &CaptureDevice,
        frames: FrameSender,
    ) -> Result<Box<dyn InputStream>, AttachError>;
}
