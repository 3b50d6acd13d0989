//! Frame value object carried from inputs to sinks

use crate::domain::device::{DeviceId, MediaKind};

/// Raw audio sample encoding of a frame payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    I16,
    F32,
}

impl SampleFormat {
    /// Bytes per sample
    pub const fn sample_size(&self) -> usize {
        match self {
            Self::I16 => 2,
            Self::F32 => 4,
        }
    }
}

/// Stream parameters carried by each frame.
/// Writers learn the stream layout from the first frame of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameInfo {
    Video {
        width: u32,
        height: u32,
    },
    Audio {
        sample_rate: u32,
        channels: u16,
        format: SampleFormat,
    },
}

impl FrameInfo {
    pub const fn kind(&self) -> MediaKind {
        match self {
            Self::Video { .. } => MediaKind::Video,
            Self::Audio { .. } => MediaKind::Audio,
        }
    }
}

/// One captured frame with an opaque payload.
/// Per device, `sequence` is strictly increasing in capture order.
#[derive(Debug, Clone)]
pub struct Frame {
    pub device: DeviceId,
    pub kind: MediaKind,
    pub sequence: u64,
    pub data: Vec<u8>,
    pub info: FrameInfo,
}

impl Frame {
    pub fn video(device: impl Into<DeviceId>, sequence: u64, data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            device: device.into(),
            kind: MediaKind::Video,
            sequence,
            data,
            info: FrameInfo::Video { width, height },
        }
    }

    pub fn audio(
        device: impl Into<DeviceId>,
        sequence: u64,
        data: Vec<u8>,
        sample_rate: u32,
        channels: u16,
        format: SampleFormat,
    ) -> Self {
        Self {
            device: device.into(),
            kind: MediaKind::Audio,
            sequence,
            data,
            info: FrameInfo::Audio {
                sample_rate,
                channels,
                format,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
