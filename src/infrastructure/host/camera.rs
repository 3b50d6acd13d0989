//! Camera input streams using nokhwa
//!
//! nokhwa's Camera blocks on frame reads, so each stream runs a capture
//! loop on its own thread. Startup success or failure is reported over a
//! oneshot channel before the loop begins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::application::ports::{AttachError, FrameSender, InputStream};
use crate::domain::device::{CaptureDevice, DeviceId};
use crate::domain::frame::Frame;

/// Handle to a running camera stream.
struct CameraStream {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl InputStream for CameraStream {
    fn close(self: Box<Self>) {
        let this = *self;
        this.stop.store(true, Ordering::SeqCst);
        if this.thread.join().is_err() {
            warn!("camera stream thread panicked during shutdown");
        }
    }
}

/// Open a capture stream on the given camera.
pub(super) async fn open_stream(
    device: &CaptureDevice,
    frames: FrameSender,
) -> Result<Box<dyn InputStream>, AttachError> {
    let stop = Arc::new(AtomicBool::new(false));
    let (ready_tx, ready_rx) = oneshot::channel();

    let device_id = device.id.clone();
    let thread_stop = Arc::clone(&stop);
    let thread = std::thread::spawn(move || {
        run_capture(device_id, frames, thread_stop, ready_tx);
    });

    match ready_rx.await {
        Ok(Ok(())) => Ok(Box::new(CameraStream { stop, thread })),
        Ok(Err(err)) => {
            let _ = thread.join();
            Err(err)
        }
        Err(_) => {
            stop.store(true, Ordering::SeqCst);
            let _ = thread.join();
            Err(AttachError::OpenFailed {
                device: device.id.clone(),
                reason: "capture thread exited before startup".to_string(),
            })
        }
    }
}

/// Recover the nokhwa index from an enumerated device id.
///
/// Numeric ids come from `CameraIndex::Index`, anything else is a
/// backend-specific string index.
fn camera_index(id: &DeviceId) -> CameraIndex {
    match id.as_str().parse::<u32>() {
        Ok(index) => CameraIndex::Index(index),
        Err(_) => CameraIndex::String(id.as_str().to_string()),
    }
}

fn run_capture(
    id: DeviceId,
    frames: FrameSender,
    stop: Arc<AtomicBool>,
    ready: oneshot::Sender<Result<(), AttachError>>,
) {
    let startup = (|| {
        let requested =
            RequestedFormat::new::<RgbAFormat>(RequestedFormatType::AbsoluteHighestResolution);
        let mut camera =
            Camera::new(camera_index(&id), requested).map_err(|e| AttachError::OpenFailed {
                device: id.clone(),
                reason: e.to_string(),
            })?;
        camera.open_stream().map_err(|e| AttachError::OpenFailed {
            device: id.clone(),
            reason: e.to_string(),
        })?;
        Ok(camera)
    })();

    let mut camera = match startup {
        Ok(camera) => {
            let _ = ready.send(Ok(()));
            camera
        }
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };

    debug!(device = %id, "camera stream running");
    let mut sequence: u64 = 0;
    while !stop.load(Ordering::SeqCst) {
        let raw = match camera.frame() {
            Ok(raw) => raw,
            Err(err) => {
                // Transient read errors happen while the device warms up.
                debug!(device = %id, error = %err, "camera frame read failed");
                continue;
            }
        };
        let image = match raw.decode_image::<RgbAFormat>() {
            Ok(image) => image,
            Err(err) => {
                debug!(device = %id, error = %err, "camera frame decode failed");
                continue;
            }
        };

        let (width, height) = (image.width(), image.height());
        let frame = Frame::video(id.clone(), sequence, image.into_raw(), width, height);
        sequence += 1;
        // Frame reads pace the loop; a full channel drops the frame.
        let _ = frames.try_send(frame);
    }

    if let Err(err) = camera.stop_stream() {
        warn!(device = %id, error = %err, "failed to stop camera stream");
    }
    debug!(device = %id, "camera stream stopped");
}
