//! Capture event sink port interface

use std::path::Path;

use crate::domain::frame::Frame;

use super::writer::WriterError;

/// Port for observing live frames and recording lifecycle events.
///
/// All methods default to no-ops so observers implement only what they care
/// about. Frame callbacks run on the capture pump tasks and must return
/// quickly; heavy work belongs on the observer's own executor.
pub trait CaptureObserver: Send + Sync + 'static {
    /// A video frame was captured.
    fn video_frame(&self, _frame: &Frame) {}

    /// An audio frame was captured.
    fn audio_frame(&self, _frame: &Frame) {}

    /// The file writer opened against `path`.
    fn recording_started(&self, _path: &Path) {}

    /// The file writer closed. `error` is Some when recording failed to
    /// open, write, or finalize; delivery happens strictly after the last
    /// frame written to the file.
    fn recording_finished(&self, _path: &Path, _error: Option<WriterError>) {}
}

/// Observer that ignores every event.
pub struct NullObserver;

impl CaptureObserver for NullObserver {}
