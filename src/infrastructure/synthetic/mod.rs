//! Synthetic device adapters for demos and tests
//!
//! These adapters fabricate a small device roster and generate frames on
//! a timer, so sessions can run on machines with no camera or microphone
//! attached (CI included).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::application::ports::{
    AttachError, CaptureHost, DeviceEnumerator, DeviceError, FrameSender, InputStream,
};
use crate::domain::device::{CaptureDevice, DeviceId, DevicePosition, MediaKind};
use crate::domain::frame::{Frame, SampleFormat};

const VIDEO_WIDTH: u32 = 8;
const VIDEO_HEIGHT: u32 = 8;
const AUDIO_SAMPLE_RATE: u32 = 8_000;
const AUDIO_SAMPLES_PER_FRAME: usize = 64;

/// Enumerator over a fixed, fabricated device roster.
pub struct SyntheticEnumerator {
    devices: Vec<CaptureDevice>,
}

impl SyntheticEnumerator {
    /// Roster with a front camera, a back camera, and a microphone.
    pub fn standard() -> Self {
        Self::with_devices(vec![
            CaptureDevice::new(
                "cam0",
                "Synthetic Front Camera",
                MediaKind::Video,
                DevicePosition::Front,
            ),
            CaptureDevice::new(
                "cam1",
                "Synthetic Back Camera",
                MediaKind::Video,
                DevicePosition::Back,
            ),
            CaptureDevice::new(
                "mic0",
                "Synthetic Microphone",
                MediaKind::Audio,
                DevicePosition::Unspecified,
            ),
        ])
    }

    pub fn with_devices(devices: Vec<CaptureDevice>) -> Self {
        Self { devices }
    }
}

#[async_trait]
impl DeviceEnumerator for SyntheticEnumerator {
    async fn list_devices(&self, kind: MediaKind) -> Result<Vec<CaptureDevice>, DeviceError> {
        Ok(self
            .devices
            .iter()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect())
    }
}

/// Capture host that generates frames on a timer.
pub struct SyntheticHost {
    cadence: StdDuration,
    fail_ids: Vec<DeviceId>,
}

impl SyntheticHost {
    pub fn new() -> Self {
        Self {
            cadence: StdDuration::from_millis(33),
            fail_ids: Vec::new(),
        }
    }

    /// Override the interval between generated frames.
    pub fn with_cadence(mut self, cadence: StdDuration) -> Self {
        self.cadence = cadence;
        self
    }

    /// Mark a device as broken; opening it fails with `AttachError::OpenFailed`.
    pub fn failing_device(mut self, id: impl Into<DeviceId>) -> Self {
        self.fail_ids.push(id.into());
        self
    }
}

impl Default for SyntheticHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureHost for SyntheticHost {
    async fn open_stream(
        &self,
        device: &CaptureDevice,
        frames: FrameSender,
    ) -> Result<Box<dyn InputStream>, AttachError> {
        if self.fail_ids.contains(&device.id) {
            return Err(AttachError::OpenFailed {
                device: device.id.clone(),
                reason: "synthetic device marked as broken".to_string(),
            });
        }

        let stop = Arc::new(AtomicBool::new(false));
        let task_stop = Arc::clone(&stop);
        let id = device.id.clone();
        let kind = device.kind;
        let cadence = self.cadence;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cadence);
            let mut sequence: u64 = 0;
            loop {
                ticker.tick().await;
                if task_stop.load(Ordering::SeqCst) {
                    break;
                }
                let frame = match kind {
                    MediaKind::Video => video_frame(&id, sequence),
                    MediaKind::Audio => audio_frame(&id, sequence),
                };
                sequence += 1;
                let _ = frames.try_send(frame);
            }
            debug!(device = %id, "synthetic stream finished");
        });

        Ok(Box::new(SyntheticStream { stop, task }))
    }
}

struct SyntheticStream {
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl InputStream for SyntheticStream {
    fn close(self: Box<Self>) {
        // The flag stops frame generation before the task is torn down.
        self.stop.store(true, Ordering::SeqCst);
        self.task.abort();
    }
}

/// Tiny RGBA test card whose shade varies with the sequence number.
fn video_frame(id: &DeviceId, sequence: u64) -> Frame {
    let shade = (sequence % 256) as u8;
    let mut data = Vec::with_capacity((VIDEO_WIDTH * VIDEO_HEIGHT * 4) as usize);
    for pixel in 0..(VIDEO_WIDTH * VIDEO_HEIGHT) {
        data.extend_from_slice(&[shade, (pixel % 256) as u8, 0x80, 0xff]);
    }
    Frame::video(id.clone(), sequence, data, VIDEO_WIDTH, VIDEO_HEIGHT)
}

/// Mono i16 silence.
fn audio_frame(id: &DeviceId, sequence: u64) -> Frame {
    let data = vec![0u8; AUDIO_SAMPLES_PER_FRAME * 2];
    Frame::audio(
        id.clone(),
        sequence,
        data,
        AUDIO_SAMPLE_RATE,
        1,
        SampleFormat::I16,
    )
}
