//! Capture session state machine

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::device::{CaptureDevice, MediaKind};

/// Session lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Configured,
    Running,
    Stopped,
}

impl SessionPhase {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Configured => "configured",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid phase transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {phase} phase")]
pub struct InvalidStateTransition {
    pub phase: SessionPhase,
    pub action: String,
}

impl InvalidStateTransition {
    fn new(phase: SessionPhase, action: &str) -> Self {
        Self {
            phase,
            action: action.to_string(),
        }
    }
}

/// Capture session entity.
/// Owns the input bindings, the output path, and the recording flag.
///
/// Phase machine:
///   IDLE -> CONFIGURED (configure)
///   CONFIGURED -> RUNNING (begin_capture)
///   RUNNING -> STOPPED (end_capture, only once recording has ended)
///   STOPPED -> CONFIGURED (configure, for a fresh recording)
///   STOPPED -> RUNNING (begin_capture, reusing the prior configuration)
///
/// While RUNNING the session additionally tracks whether the file writer is
/// open (`recording`). Capture and recording end separately so the writer can
/// be closed before the streams go down.
///
/// Invariants: at most one video and one audio input at any instant; the
/// video input swaps only through `swap_video`; `recording` implies RUNNING.
#[derive(Debug, Default)]
pub struct CaptureSession {
    phase: SessionPhase,
    video_input: Option<CaptureDevice>,
    audio_input: Option<CaptureDevice>,
    output_path: Option<PathBuf>,
    recording: bool,
}

impl CaptureSession {
    /// Create a new session in the idle phase with nothing attached
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current phase
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Check if capture is running
    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    /// Check if the file writer is open
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// The bound video input, if any
    pub fn video_input(&self) -> Option<&CaptureDevice> {
        self.video_input.as_ref()
    }

    /// The bound audio input, if any
    pub fn audio_input(&self) -> Option<&CaptureDevice> {
        self.audio_input.as_ref()
    }

    /// The bound input of the given kind, if any
    pub fn input(&self, kind: MediaKind) -> Option<&CaptureDevice> {
        match kind {
            MediaKind::Video => self.video_input(),
            MediaKind::Audio => self.audio_input(),
        }
    }

    /// The bound output path, if any
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Bind inputs and the output path. Valid from IDLE or STOPPED.
    ///
    /// Replaces any prior configuration wholesale. A second configure without
    /// an intervening stop is rejected and leaves the bindings untouched.
    pub fn configure(
        &mut self,
        video: CaptureDevice,
        audio: CaptureDevice,
        output: PathBuf,
    ) -> Result<(), InvalidStateTransition> {
        if self.phase != SessionPhase::Idle && self.phase != SessionPhase::Stopped {
            return Err(InvalidStateTransition::new(self.phase, "configure"));
        }
        self.video_input = Some(video);
        self.audio_input = Some(audio);
        self.output_path = Some(output);
        self.phase = SessionPhase::Configured;
        Ok(())
    }

    /// Transition to RUNNING. Valid from CONFIGURED, or from STOPPED when a
    /// prior configuration is still bound.
    pub fn begin_capture(&mut self) -> Result<(), InvalidStateTransition> {
        let configured = self.video_input.is_some()
            && self.audio_input.is_some()
            && self.output_path.is_some();
        let phase_ok = self.phase == SessionPhase::Configured
            || (self.phase == SessionPhase::Stopped && configured);
        if !phase_ok {
            return Err(InvalidStateTransition::new(self.phase, "begin capture"));
        }
        self.phase = SessionPhase::Running;
        Ok(())
    }

    /// Mark the file writer open. Valid while RUNNING and not yet recording.
    pub fn begin_recording(&mut self) -> Result<(), InvalidStateTransition> {
        if self.phase != SessionPhase::Running || self.recording {
            return Err(InvalidStateTransition::new(self.phase, "begin recording"));
        }
        self.recording = true;
        Ok(())
    }

    /// Mark the file writer closed. Valid while recording.
    pub fn end_recording(&mut self) -> Result<(), InvalidStateTransition> {
        if !self.recording {
            return Err(InvalidStateTransition::new(self.phase, "end recording"));
        }
        self.recording = false;
        Ok(())
    }

    /// Transition to STOPPED. Valid from RUNNING once recording has ended;
    /// the writer must be closed before the streams go down.
    pub fn end_capture(&mut self) -> Result<(), InvalidStateTransition> {
        if self.phase != SessionPhase::Running || self.recording {
            return Err(InvalidStateTransition::new(self.phase, "end capture"));
        }
        self.phase = SessionPhase::Stopped;
        Ok(())
    }

    /// Replace the video input, returning the one it displaces.
    /// Valid from CONFIGURED or RUNNING with a video input bound.
    pub fn swap_video(
        &mut self,
        replacement: CaptureDevice,
    ) -> Result<CaptureDevice, InvalidStateTransition> {
        let phase_ok =
            self.phase == SessionPhase::Configured || self.phase == SessionPhase::Running;
        if !phase_ok {
            return Err(InvalidStateTransition::new(self.phase, "switch camera"));
        }
        match self.video_input.take() {
            Some(previous) => {
                self.video_input = Some(replacement);
                Ok(previous)
            }
            None => Err(InvalidStateTransition::new(self.phase, "switch camera")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::{DevicePosition, MediaKind};

    fn front_cam() -> CaptureDevice {
        CaptureDevice::new("cam0", "Front Camera", MediaKind::Video, DevicePosition::Front)
    }

    fn back_cam() -> CaptureDevice {
        CaptureDevice::new("cam1", "Back Camera", MediaKind::Video, DevicePosition::Back)
    }

    fn mic() -> CaptureDevice {
        CaptureDevice::new("mic0", "Built-in Mic", MediaKind::Audio, DevicePosition::Unspecified)
    }

    fn configured() -> CaptureSession {
        let mut session = CaptureSession::new();
        session
            .configure(front_cam(), mic(), PathBuf::from("/tmp/out.mp4"))
            .unwrap();
        session
    }

    #[test]
    fn new_session_is_idle_and_empty() {
        let session = CaptureSession::new();
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.video_input().is_none());
        assert!(session.audio_input().is_none());
        assert!(session.output_path().is_none());
        assert!(!session.is_recording());
    }

    #[test]
    fn configure_from_idle_binds_inputs() {
        let session = configured();
        assert_eq!(session.phase(), SessionPhase::Configured);
        assert_eq!(session.video_input().unwrap().id, front_cam().id);
        assert_eq!(session.audio_input().unwrap().id, mic().id);
        assert_eq!(session.output_path().unwrap(), Path::new("/tmp/out.mp4"));
    }

    #[test]
    fn configure_twice_without_stop_fails() {
        let mut session = configured();

        let err = session
            .configure(back_cam(), mic(), PathBuf::from("/tmp/other.mp4"))
            .unwrap_err();
        assert_eq!(err.phase, SessionPhase::Configured);

        // The original bindings are untouched, one input of each kind.
        assert_eq!(session.video_input().unwrap().id, front_cam().id);
        assert_eq!(session.audio_input().unwrap().id, mic().id);
        assert_eq!(session.output_path().unwrap(), Path::new("/tmp/out.mp4"));
    }

    #[test]
    fn configure_while_running_fails() {
        let mut session = configured();
        session.begin_capture().unwrap();

        let err = session
            .configure(back_cam(), mic(), PathBuf::from("/tmp/other.mp4"))
            .unwrap_err();
        assert_eq!(err.phase, SessionPhase::Running);
    }

    #[test]
    fn begin_capture_from_configured() {
        let mut session = configured();
        assert!(session.begin_capture().is_ok());
        assert!(session.is_running());
    }

    #[test]
    fn begin_capture_from_idle_fails() {
        let mut session = CaptureSession::new();
        let err = session.begin_capture().unwrap_err();
        assert_eq!(err.phase, SessionPhase::Idle);
    }

    #[test]
    fn recording_lifecycle_within_running() {
        let mut session = configured();
        session.begin_capture().unwrap();

        assert!(session.begin_recording().is_ok());
        assert!(session.is_recording());

        assert!(session.end_recording().is_ok());
        assert!(!session.is_recording());
    }

    #[test]
    fn begin_recording_outside_running_fails() {
        let mut session = configured();
        let err = session.begin_recording().unwrap_err();
        assert_eq!(err.phase, SessionPhase::Configured);
    }

    #[test]
    fn begin_recording_twice_fails() {
        let mut session = configured();
        session.begin_capture().unwrap();
        session.begin_recording().unwrap();
        assert!(session.begin_recording().is_err());
    }

    #[test]
    fn end_capture_requires_recording_closed_first() {
        let mut session = configured();
        session.begin_capture().unwrap();
        session.begin_recording().unwrap();

        let err = session.end_capture().unwrap_err();
        assert_eq!(err.phase, SessionPhase::Running);

        session.end_recording().unwrap();
        assert!(session.end_capture().is_ok());
        assert_eq!(session.phase(), SessionPhase::Stopped);
    }

    #[test]
    fn end_capture_from_configured_fails() {
        let mut session = configured();
        let err = session.end_capture().unwrap_err();
        assert_eq!(err.phase, SessionPhase::Configured);
    }

    #[test]
    fn stopped_session_can_reconfigure() {
        let mut session = configured();
        session.begin_capture().unwrap();
        session.end_capture().unwrap();

        assert!(session
            .configure(back_cam(), mic(), PathBuf::from("/tmp/two.mp4"))
            .is_ok());
        assert_eq!(session.phase(), SessionPhase::Configured);
        assert_eq!(session.video_input().unwrap().id, back_cam().id);
    }

    #[test]
    fn stopped_session_can_restart_with_prior_configuration() {
        let mut session = configured();
        session.begin_capture().unwrap();
        session.end_capture().unwrap();

        assert!(session.begin_capture().is_ok());
        assert!(session.is_running());
        assert_eq!(session.video_input().unwrap().id, front_cam().id);
    }

    #[test]
    fn swap_video_replaces_and_returns_previous() {
        let mut session = configured();
        session.begin_capture().unwrap();

        let previous = session.swap_video(back_cam()).unwrap();
        assert_eq!(previous.id, front_cam().id);
        assert_eq!(session.video_input().unwrap().id, back_cam().id);

        // Audio input is untouched by the swap.
        assert_eq!(session.audio_input().unwrap().id, mic().id);
    }

    #[test]
    fn swap_video_while_configured_is_a_rebind() {
        let mut session = configured();
        let previous = session.swap_video(back_cam()).unwrap();
        assert_eq!(previous.id, front_cam().id);
        assert_eq!(session.phase(), SessionPhase::Configured);
    }

    #[test]
    fn swap_video_from_idle_fails() {
        let mut session = CaptureSession::new();
        let err = session.swap_video(back_cam()).unwrap_err();
        assert_eq!(err.phase, SessionPhase::Idle);
        assert!(session.video_input().is_none());
    }

    #[test]
    fn swap_video_from_stopped_fails() {
        let mut session = configured();
        session.begin_capture().unwrap();
        session.end_capture().unwrap();

        let err = session.swap_video(back_cam()).unwrap_err();
        assert_eq!(err.phase, SessionPhase::Stopped);
        assert_eq!(session.video_input().unwrap().id, front_cam().id);
    }

    #[test]
    fn full_cycle() {
        let mut session = configured();
        session.begin_capture().unwrap();
        session.begin_recording().unwrap();
        session.end_recording().unwrap();
        session.end_capture().unwrap();
        assert_eq!(session.phase(), SessionPhase::Stopped);

        // A second recording can start from the stopped phase.
        session.begin_capture().unwrap();
        assert!(session.is_running());
    }

    #[test]
    fn phase_display() {
        assert_eq!(SessionPhase::Idle.to_string(), "idle");
        assert_eq!(SessionPhase::Configured.to_string(), "configured");
        assert_eq!(SessionPhase::Running.to_string(), "running");
        assert_eq!(SessionPhase::Stopped.to_string(), "stopped");
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition::new(SessionPhase::Stopped, "switch camera");
        let msg = err.to_string();
        assert!(msg.contains("switch camera"));
        assert!(msg.contains("stopped"));
    }
}
