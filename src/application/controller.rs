//! Capture session controller use case

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::device::{CaptureDevice, DevicePosition, MediaKind};
use crate::domain::frame::Frame;
use crate::domain::session::{CaptureSession, InvalidStateTransition, SessionPhase};

use super::ports::{
    AttachError, CaptureHost, CaptureObserver, DeviceError, DeviceEnumerator, InputStream,
    MovieWriter, WriterError,
};

/// Per-input frame channel depth. Streams drop frames beyond this rather
/// than block their capture callbacks.
const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Errors from the session controller
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Device selection failed: {0}")]
    Device(#[from] DeviceError),

    #[error("Input attach failed: {0}")]
    Attach(#[from] AttachError),

    #[error("Invalid state transition: {0}")]
    InvalidState(#[from] InvalidStateTransition),
}

/// File writer shared between the controller and the frame pumps.
///
/// Frames are written and the writer is finished under the same lock, which
/// is what makes the finished notification land strictly after the last
/// written frame.
struct WriterSlot<W> {
    writer: W,
    open: bool,
    path: Option<PathBuf>,
    failure: Option<WriterError>,
}

/// One attached input: its device, its hardware stream, and the pump task
/// moving frames from the stream channel to the observer and writer.
struct ActiveInput {
    device: CaptureDevice,
    stream: Box<dyn InputStream>,
    pump: JoinHandle<()>,
    gate: Arc<AtomicBool>,
    cancel: watch::Sender<bool>,
}

impl ActiveInput {
    /// Tear the input down: cancel the pump, close the stream, and wait for
    /// the pump to observe the cancel. No frame from this input is delivered
    /// after this returns.
    async fn shutdown(self) {
        let _ = self.cancel.send(true);
        self.stream.close();
        let _ = self.pump.await;
        debug!(device = %self.device.id, "input stream closed");
    }
}

struct Inner {
    session: CaptureSession,
    video: Option<ActiveInput>,
    audio: Option<ActiveInput>,
}

/// Capture session use case.
///
/// Owns one [`CaptureSession`] and drives it through configure, start,
/// switch-camera, and stop. All transitions are serialized under one mutex;
/// frame pumps run concurrently with transitions but never mutate session
/// state themselves.
pub struct SessionController<E, H, W, O>
where
    E: DeviceEnumerator,
    H: CaptureHost,
    W: MovieWriter,
    O: CaptureObserver,
{
    enumerator: E,
    host: H,
    observer: Arc<O>,
    writer: Arc<StdMutex<WriterSlot<W>>>,
    inner: Mutex<Inner>,
}

impl<E, H, W, O> SessionController<E, H, W, O>
where
    E: DeviceEnumerator,
    H: CaptureHost,
    W: MovieWriter,
    O: CaptureObserver,
{
    /// Create a controller with an idle, empty session.
    pub fn new(enumerator: E, host: H, writer: W, observer: Arc<O>) -> Self {
        Self {
            enumerator,
            host,
            observer,
            writer: Arc::new(StdMutex::new(WriterSlot {
                writer,
                open: false,
                path: None,
                failure: None,
            })),
            inner: Mutex::new(Inner {
                session: CaptureSession::new(),
                video: None,
                audio: None,
            }),
        }
    }

    /// Get the current session phase.
    pub async fn phase(&self) -> SessionPhase {
        self.inner.lock().await.session.phase()
    }

    /// Check whether the file writer is open.
    pub async fn is_recording(&self) -> bool {
        self.inner.lock().await.session.is_recording()
    }

    /// The currently bound input of the given kind, if any.
    pub async fn bound_device(&self, kind: MediaKind) -> Option<CaptureDevice> {
        self.inner.lock().await.session.input(kind).cloned()
    }

    /// Bind a front camera, the default microphone, and the output path.
    pub async fn configure(&self, output: PathBuf) -> Result<(), SessionError> {
        self.configure_facing(output, DevicePosition::Front).await
    }

    /// Bind a camera with the given facing, the default microphone, and the
    /// output path. Valid from the idle or stopped phase.
    ///
    /// Any failure aborts the whole operation and leaves the prior bindings
    /// untouched; there is never a partially bound input set.
    pub async fn configure_facing(
        &self,
        output: PathBuf,
        position: DevicePosition,
    ) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;

        // Reject the phase before touching the enumerator so a configure in
        // the wrong phase reports the transition error, not a device error.
        let phase = inner.session.phase();
        if phase != SessionPhase::Idle && phase != SessionPhase::Stopped {
            return Err(InvalidStateTransition {
                phase,
                action: "configure".to_string(),
            }
            .into());
        }

        let video = self
            .enumerator
            .find_device(MediaKind::Video, Some(position))
            .await?;
        let audio = self.enumerator.find_device(MediaKind::Audio, None).await?;

        info!(video = %video.id, audio = %audio.id, output = %output.display(), "session configured");
        inner.session.configure(video, audio, output)?;
        Ok(())
    }

    /// Open the hardware streams, then open the writer and announce
    /// `recording_started`. Valid from the configured phase, or from stopped
    /// with the prior configuration still bound.
    ///
    /// A stream that fails to open rolls back every stream opened so far and
    /// returns the attach error. A writer that fails to open leaves capture
    /// running and is announced as `recording_finished` with the error.
    pub async fn start(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;

        let phase = inner.session.phase();
        let bindings = (
            inner.session.video_input().cloned(),
            inner.session.audio_input().cloned(),
            inner.session.output_path().map(PathBuf::from),
        );
        let (video_dev, audio_dev, path) = match (phase, bindings) {
            (
                SessionPhase::Configured | SessionPhase::Stopped,
                (Some(video), Some(audio), Some(path)),
            ) => (video, audio, path),
            _ => {
                return Err(InvalidStateTransition {
                    phase,
                    action: "begin capture".to_string(),
                }
                .into())
            }
        };

        let video_input = self.spawn_input(&video_dev, true).await?;
        let audio_input = match self.spawn_input(&audio_dev, true).await {
            Ok(input) => input,
            Err(err) => {
                // Roll back the stream that did open.
                video_input.shutdown().await;
                return Err(err.into());
            }
        };

        inner.session.begin_capture()?;
        inner.video = Some(video_input);
        inner.audio = Some(audio_input);
        info!(video = %video_dev.id, audio = %audio_dev.id, "capture started");

        let begin_result = {
            let mut slot = self.lock_writer();
            match slot.writer.begin(&path) {
                Ok(()) => {
                    slot.open = true;
                    slot.path = Some(path.clone());
                    slot.failure = None;
                    Ok(())
                }
                Err(err) => Err(err),
            }
        };
        match begin_result {
            Ok(()) => {
                inner.session.begin_recording()?;
                self.observer.recording_started(&path);
                info!(output = %path.display(), "recording started");
            }
            Err(err) => {
                // Capture keeps running without a file writer.
                warn!(output = %path.display(), error = %err, "writer failed to open");
                self.observer.recording_finished(&path, Some(err));
            }
        }

        Ok(())
    }

    /// Swap the video input for the camera on the opposite side.
    /// Valid from the configured or running phase.
    ///
    /// While running the swap is linearizable with respect to frame
    /// delivery: the replacement stream is opened gated shut before the
    /// current input's removal begins, no further frames from the old camera
    /// are delivered once removal begins, and no frame from the new camera
    /// is delivered until the swap commits.
    ///
    /// # Returns
    /// The newly bound device, or an error that leaves the input set
    /// unchanged.
    pub async fn switch_camera(&self) -> Result<CaptureDevice, SessionError> {
        let mut inner = self.inner.lock().await;

        let phase = inner.session.phase();
        let current = match (phase, inner.session.video_input()) {
            (SessionPhase::Configured | SessionPhase::Running, Some(device)) => device.clone(),
            _ => {
                return Err(InvalidStateTransition {
                    phase,
                    action: "switch camera".to_string(),
                }
                .into())
            }
        };

        let target = match current.position.opposite() {
            Some(position) => position,
            None => {
                return Err(DeviceError::NoDeviceAvailable {
                    kind: MediaKind::Video,
                    position: DevicePosition::Unspecified,
                }
                .into())
            }
        };

        // Fresh snapshot; the opposite camera may have been unplugged.
        let replacement = self
            .enumerator
            .find_device(MediaKind::Video, Some(target))
            .await?;

        if phase == SessionPhase::Running {
            // Open the replacement gated shut so the current camera is never
            // lost while the new one is unconfirmed.
            let incoming = self.spawn_input(&replacement, false).await?;
            if let Some(outgoing) = inner.video.take() {
                outgoing.shutdown().await;
            }
            incoming.gate.store(true, Ordering::Release);
            inner.session.swap_video(replacement.clone())?;
            inner.video = Some(incoming);
        } else {
            // Not capturing yet; the swap is a pure rebind.
            inner.session.swap_video(replacement.clone())?;
        }

        info!(from = %current.id, to = %replacement.id, "camera switched");
        Ok(replacement)
    }

    /// Stop recording and capture. Valid from the running phase.
    ///
    /// Order of teardown: the writer is finished first and
    /// `recording_finished` is delivered, then the hardware streams are
    /// closed and their pumps drained. The finished notification therefore
    /// always precedes the capture-stopped report.
    pub async fn stop(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;

        let phase = inner.session.phase();
        if phase != SessionPhase::Running {
            return Err(InvalidStateTransition {
                phase,
                action: "stop".to_string(),
            }
            .into());
        }

        if inner.session.is_recording() {
            let (path, error) = {
                let mut slot = self.lock_writer();
                let close_error = if slot.open {
                    slot.open = false;
                    slot.writer.finish().err()
                } else {
                    None
                };
                // A write failure latched by a pump wins over a close error.
                (slot.path.take(), slot.failure.take().or(close_error))
            };
            inner.session.end_recording()?;
            if let Some(path) = path {
                match &error {
                    Some(err) => warn!(output = %path.display(), error = %err, "recording finished with error"),
                    None => info!(output = %path.display(), "recording finished"),
                }
                self.observer.recording_finished(&path, error);
            }
        }

        if let Some(video) = inner.video.take() {
            video.shutdown().await;
        }
        if let Some(audio) = inner.audio.take() {
            audio.shutdown().await;
        }
        inner.session.end_capture()?;
        info!("capture stopped");
        Ok(())
    }

    /// Open a stream on `device` and spawn its pump task.
    async fn spawn_input(
        &self,
        device: &CaptureDevice,
        gate_open: bool,
    ) -> Result<ActiveInput, AttachError> {
        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let stream = self.host.open_stream(device, tx).await?;
        let gate = Arc::new(AtomicBool::new(gate_open));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let pump = tokio::spawn(pump_frames(
            rx,
            cancel_rx,
            gate.clone(),
            self.observer.clone(),
            self.writer.clone(),
        ));
        debug!(device = %device.id, kind = %device.kind, "input stream opened");
        Ok(ActiveInput {
            device: device.clone(),
            stream,
            pump,
            gate,
            cancel: cancel_tx,
        })
    }

    fn lock_writer(&self) -> MutexGuard<'_, WriterSlot<W>> {
        // A poisoned slot only means a pump panicked mid-write; the slot
        // data itself stays coherent.
        self.writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Move frames from one input channel to the observer and the writer.
///
/// Cancellation is checked before every delivery, so once the controller
/// cancels this pump no further frame from its input reaches the observer.
async fn pump_frames<W, O>(
    mut rx: mpsc::Receiver<Frame>,
    mut cancel: watch::Receiver<bool>,
    gate: Arc<AtomicBool>,
    observer: Arc<O>,
    writer: Arc<StdMutex<WriterSlot<W>>>,
) where
    W: MovieWriter,
    O: CaptureObserver,
{
    loop {
        tokio::select! {
            biased;
            _ = cancel.changed() => break,
            frame = rx.recv() => {
                let Some(frame) = frame else { break };
                if !gate.load(Ordering::Acquire) {
                    continue;
                }
                match frame.kind {
                    MediaKind::Video => observer.video_frame(&frame),
                    MediaKind::Audio => observer.audio_frame(&frame),
                }
                if let Ok(mut slot) = writer.lock() {
                    if slot.open {
                        if let Err(err) = slot.writer.write_frame(&frame) {
                            warn!(error = %err, "frame write failed, closing writer");
                            slot.open = false;
                            slot.failure = Some(err);
                        }
                    }
                }
            }
        }
    }
}
