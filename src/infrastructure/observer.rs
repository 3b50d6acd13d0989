//! Observer that reports capture activity through tracing

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::application::ports::{CaptureObserver, WriterError};
use crate::domain::frame::Frame;

const LOG_EVERY: u64 = 30;

/// Observer that counts frames and logs a sample of them.
///
/// Logging every frame would drown the output at capture rates, so only
/// every `LOG_EVERY`th frame per kind is reported.
pub struct LogSink {
    video: AtomicU64,
    audio: AtomicU64,
}

impl LogSink {
    pub fn new() -> Self {
        Self {
            video: AtomicU64::new(0),
            audio: AtomicU64::new(0),
        }
    }

    pub fn video_frames(&self) -> u64 {
        self.video.load(Ordering::Relaxed)
    }

    pub fn audio_frames(&self) -> u64 {
        self.audio.load(Ordering::Relaxed)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureObserver for LogSink {
    fn video_frame(&self, frame: &Frame) {
        let seen = self.video.fetch_add(1, Ordering::Relaxed) + 1;
        if seen % LOG_EVERY == 1 {
            debug!(
                device = %frame.device,
                sequence = frame.sequence,
                bytes = frame.data.len(),
                "video frame"
            );
        }
    }

    fn audio_frame(&self, frame: &Frame) {
        let seen = self.audio.fetch_add(1, Ordering::Relaxed) + 1;
        if seen % LOG_EVERY == 1 {
            debug!(
                device = %frame.device,
                sequence = frame.sequence,
                bytes = frame.data.len(),
                "audio frame"
            );
        }
    }

    fn recording_started(&self, path: &Path) {
        info!(path = %path.display(), "recording started");
    }

    fn recording_finished(&self, path: &Path, error: Option<WriterError>) {
        match error {
            None => info!(path = %path.display(), "recording finished"),
            Some(err) => warn!(path = %path.display(), error = %err, "recording failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_frames_per_kind() {
        let sink = LogSink::new();
        let video = Frame::video("cam0", 0, vec![0; 4], 1, 1);
        let audio = Frame::audio(
            "mic0",
            0,
            vec![0; 2],
            8_000,
            1,
            crate::domain::frame::SampleFormat::I16,
        );

        for _ in 0..3 {
            sink.video_frame(&video);
        }
        sink.audio_frame(&audio);

        assert_eq!(sink.video_frames(), 3);
        assert_eq!(sink.audio_frames(), 1);
    }

    #[test]
    fn lifecycle_events_do_not_panic() {
        let sink = LogSink::new();
        sink.recording_started(Path::new("/tmp/clip.mp4"));
        sink.recording_finished(Path::new("/tmp/clip.mp4"), None);
        sink.recording_finished(
            Path::new("/tmp/clip.mp4"),
            Some(WriterError::WriteFailed("disk full".to_string())),
        );
    }
}
