//! Microphone input streams using cpal
//!
//! cpal::Stream is not Send, so each stream lives on its own thread.
//! The thread builds the stream, reports startup success or failure over
//! a oneshot channel, then parks until the stop flag is raised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat as CpalSampleFormat;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::application::ports::{AttachError, FrameSender, InputStream};
use crate::domain::device::{CaptureDevice, DeviceId};
use crate::domain::frame::{Frame, SampleFormat};

/// Handle to a running microphone stream.
///
/// Closing raises the stop flag and joins the stream thread, which drops
/// the cpal stream and releases the device.
struct MicrophoneStream {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl InputStream for MicrophoneStream {
    fn close(self: Box<Self>) {
        let this = *self;
        this.stop.store(true, Ordering::SeqCst);
        if this.thread.join().is_err() {
            warn!("microphone stream thread panicked during shutdown");
        }
    }
}

/// Open an input stream on the named audio device.
pub(super) async fn open_stream(
    device: &CaptureDevice,
    frames: FrameSender,
) -> Result<Box<dyn InputStream>, AttachError> {
    let stop = Arc::new(AtomicBool::new(false));
    let (ready_tx, ready_rx) = oneshot::channel();

    let device_id = device.id.clone();
    let thread_stop = Arc::clone(&stop);
    let thread = std::thread::spawn(move || {
        run_stream(device_id, frames, thread_stop, ready_tx);
    });

    match ready_rx.await {
        Ok(Ok(())) => Ok(Box::new(MicrophoneStream { stop, thread })),
        Ok(Err(err)) => {
            let _ = thread.join();
            Err(err)
        }
        Err(_) => {
            stop.store(true, Ordering::SeqCst);
            let _ = thread.join();
            Err(AttachError::OpenFailed {
                device: device.id.clone(),
                reason: "stream thread exited before startup".to_string(),
            })
        }
    }
}

/// Find the cpal input device matching an enumerated id.
///
/// Audio device ids are the cpal device names, so a missing name means
/// the device was unplugged since enumeration.
fn find_device(id: &DeviceId) -> Result<cpal::Device, AttachError> {
    let host = cpal::default_host();
    let devices = host.input_devices().map_err(|e| AttachError::OpenFailed {
        device: id.clone(),
        reason: e.to_string(),
    })?;

    for device in devices {
        if device.name().map(|name| name == id.as_str()).unwrap_or(false) {
            return Ok(device);
        }
    }
    Err(AttachError::DeviceGone(id.clone()))
}

fn run_stream(
    id: DeviceId,
    frames: FrameSender,
    stop: Arc<AtomicBool>,
    ready: oneshot::Sender<Result<(), AttachError>>,
) {
    let startup = (|| {
        let device = find_device(&id)?;
        let config = device
            .default_input_config()
            .map_err(|e| AttachError::OpenFailed {
                device: id.clone(),
                reason: e.to_string(),
            })?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();
        let sample_format = config.sample_format();
        let stream_config = config.into();

        let stream = match sample_format {
            CpalSampleFormat::I16 => {
                let sender = frames.clone();
                let device_id = id.clone();
                let mut sequence: u64 = 0;
                device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let mut bytes = Vec::with_capacity(data.len() * 2);
                        for sample in data {
                            bytes.extend_from_slice(&sample.to_le_bytes());
                        }
                        let frame = Frame::audio(
                            device_id.clone(),
                            sequence,
                            bytes,
                            sample_rate,
                            channels,
                            SampleFormat::I16,
                        );
                        sequence += 1;
                        // The callback must never block; a full channel drops the frame.
                        let _ = sender.try_send(frame);
                    },
                    |err| warn!(error = %err, "audio stream error"),
                    None,
                )
            }
            CpalSampleFormat::F32 => {
                let sender = frames.clone();
                let device_id = id.clone();
                let mut sequence: u64 = 0;
                device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let mut bytes = Vec::with_capacity(data.len() * 4);
                        for sample in data {
                            bytes.extend_from_slice(&sample.to_le_bytes());
                        }
                        let frame = Frame::audio(
                            device_id.clone(),
                            sequence,
                            bytes,
                            sample_rate,
                            channels,
                            SampleFormat::F32,
                        );
                        sequence += 1;
                        let _ = sender.try_send(frame);
                    },
                    |err| warn!(error = %err, "audio stream error"),
                    None,
                )
            }
            other => {
                return Err(AttachError::OpenFailed {
                    device: id.clone(),
                    reason: format!("unsupported sample format: {other}"),
                })
            }
        }
        .map_err(|e| AttachError::OpenFailed {
            device: id.clone(),
            reason: e.to_string(),
        })?;

        stream.play().map_err(|e| AttachError::OpenFailed {
            device: id.clone(),
            reason: e.to_string(),
        })?;

        Ok(stream)
    })();

    let stream = match startup {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };

    debug!(device = %id, "microphone stream running");
    while !stop.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    drop(stream);
    debug!(device = %id, "microphone stream stopped");
}
