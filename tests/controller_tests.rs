//! Session controller integration tests using the synthetic adapters

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration as StdDuration;

use camclip::application::ports::{CaptureObserver, MovieWriter, WriterError};
use camclip::application::{SessionController, SessionError};
use camclip::domain::{MediaKind, SessionPhase};
use camclip::domain::frame::Frame;
use camclip::infrastructure::{SyntheticEnumerator, SyntheticHost};

const CADENCE: StdDuration = StdDuration::from_millis(5);
const CAPTURE_WINDOW: StdDuration = StdDuration::from_millis(200);

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Video { device: String, sequence: u64 },
    Audio { device: String, sequence: u64 },
    Started,
    Finished { failed: bool },
}

#[derive(Default)]
struct Probe {
    events: StdMutex<Vec<Event>>,
}

impl Probe {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn video_devices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Video { device, .. } => Some(device),
                _ => None,
            })
            .collect()
    }
}

impl CaptureObserver for Probe {
    fn video_frame(&self, frame: &Frame) {
        self.events.lock().unwrap().push(Event::Video {
            device: frame.device.to_string(),
            sequence: frame.sequence,
        });
    }

    fn audio_frame(&self, frame: &Frame) {
        self.events.lock().unwrap().push(Event::Audio {
            device: frame.device.to_string(),
            sequence: frame.sequence,
        });
    }

    fn recording_started(&self, _path: &Path) {
        self.events.lock().unwrap().push(Event::Started);
    }

    fn recording_finished(&self, _path: &Path, error: Option<WriterError>) {
        self.events.lock().unwrap().push(Event::Finished {
            failed: error.is_some(),
        });
    }
}

#[derive(Default)]
struct MemoryWriter {
    frames: Arc<StdMutex<Vec<(MediaKind, u64)>>>,
}

impl MovieWriter for MemoryWriter {
    fn begin(&mut self, _path: &Path) -> Result<(), WriterError> {
        Ok(())
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<(), WriterError> {
        self.frames.lock().unwrap().push((frame.kind, frame.sequence));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), WriterError> {
        Ok(())
    }
}

struct RefusingWriter;

impl MovieWriter for RefusingWriter {
    fn begin(&mut self, path: &Path) -> Result<(), WriterError> {
        Err(WriterError::OpenFailed {
            path: path.to_path_buf(),
            reason: "disk full".to_string(),
        })
    }

    fn write_frame(&mut self, _frame: &Frame) -> Result<(), WriterError> {
        Ok(())
    }

    fn finish(&mut self) -> Result<(), WriterError> {
        Ok(())
    }
}

fn controller_with<W: MovieWriter>(
    host: SyntheticHost,
    writer: W,
) -> (
    SessionController<SyntheticEnumerator, SyntheticHost, W, Probe>,
    Arc<Probe>,
) {
    let probe = Arc::new(Probe::default());
    let controller = SessionController::new(
        SyntheticEnumerator::standard(),
        host,
        writer,
        Arc::clone(&probe),
    );
    (controller, probe)
}

fn output_path() -> PathBuf {
    PathBuf::from("clip.mp4")
}

#[tokio::test]
async fn lifecycle_emits_one_event_pair_with_frames_between() {
    let host = SyntheticHost::new().with_cadence(CADENCE);
    let (controller, probe) = controller_with(host, MemoryWriter::default());

    controller.configure(output_path()).await.unwrap();
    controller.start().await.unwrap();
    tokio::time::sleep(CAPTURE_WINDOW).await;
    controller.stop().await.unwrap();

    let events = probe.events();
    let started: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, Event::Started))
        .map(|(i, _)| i)
        .collect();
    let finished: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, Event::Finished { .. }))
        .map(|(i, _)| i)
        .collect();

    assert_eq!(started.len(), 1);
    assert_eq!(finished.len(), 1);
    assert!(started[0] < finished[0]);
    assert_eq!(events[finished[0]], Event::Finished { failed: false });

    let videos = events.iter().filter(|e| matches!(e, Event::Video { .. }));
    let audios = events.iter().filter(|e| matches!(e, Event::Audio { .. }));
    assert!(videos.count() > 0, "expected video frames");
    assert!(audios.count() > 0, "expected audio frames");
    assert_eq!(controller.phase().await, SessionPhase::Stopped);
}

#[tokio::test]
async fn frames_are_written_while_recording() {
    let host = SyntheticHost::new().with_cadence(CADENCE);
    let writer = MemoryWriter::default();
    let written = Arc::clone(&writer.frames);
    let (controller, _probe) = controller_with(host, writer);

    controller.configure(output_path()).await.unwrap();
    controller.start().await.unwrap();
    tokio::time::sleep(CAPTURE_WINDOW).await;
    controller.stop().await.unwrap();

    let frames = written.lock().unwrap();
    assert!(frames.iter().any(|(kind, _)| *kind == MediaKind::Video));
    assert!(frames.iter().any(|(kind, _)| *kind == MediaKind::Audio));
}

#[tokio::test]
async fn sequences_increase_per_device() {
    let host = SyntheticHost::new().with_cadence(CADENCE);
    let (controller, probe) = controller_with(host, MemoryWriter::default());

    controller.configure(output_path()).await.unwrap();
    controller.start().await.unwrap();
    tokio::time::sleep(CAPTURE_WINDOW).await;
    controller.stop().await.unwrap();

    let mut last_video: Option<u64> = None;
    let mut last_audio: Option<u64> = None;
    for event in probe.events() {
        match event {
            Event::Video { sequence, .. } => {
                if let Some(last) = last_video {
                    assert!(sequence > last, "video sequence went backwards");
                }
                last_video = Some(sequence);
            }
            Event::Audio { sequence, .. } => {
                if let Some(last) = last_audio {
                    assert!(sequence > last, "audio sequence went backwards");
                }
                last_audio = Some(sequence);
            }
            _ => {}
        }
    }
    assert!(last_video.is_some());
    assert!(last_audio.is_some());
}

#[tokio::test]
async fn switch_camera_is_a_clean_cut() {
    let host = SyntheticHost::new().with_cadence(CADENCE);
    let (controller, probe) = controller_with(host, MemoryWriter::default());

    controller.configure(output_path()).await.unwrap();
    controller.start().await.unwrap();
    tokio::time::sleep(CAPTURE_WINDOW).await;

    let replacement = controller.switch_camera().await.unwrap();
    assert_eq!(replacement.id.as_str(), "cam1");
    let marker = probe.events().len();

    tokio::time::sleep(CAPTURE_WINDOW).await;
    controller.stop().await.unwrap();

    // No frame from the old camera may be observed after the switch returns.
    let after: Vec<Event> = probe.events().split_off(marker);
    for event in after {
        if let Event::Video { device, .. } = event {
            assert_eq!(device, "cam1", "old camera leaked a frame after switch");
        }
    }

    let bound = controller.bound_device(MediaKind::Video).await.unwrap();
    assert_eq!(bound.id.as_str(), "cam1");
}

#[tokio::test]
async fn double_switch_returns_to_the_front_camera() {
    let host = SyntheticHost::new().with_cadence(CADENCE);
    let (controller, probe) = controller_with(host, MemoryWriter::default());

    controller.configure(output_path()).await.unwrap();
    controller.start().await.unwrap();
    tokio::time::sleep(CAPTURE_WINDOW).await;

    controller.switch_camera().await.unwrap();
    let restored = controller.switch_camera().await.unwrap();
    assert_eq!(restored.id.as_str(), "cam0");

    tokio::time::sleep(CAPTURE_WINDOW).await;
    controller.stop().await.unwrap();

    let devices = probe.video_devices();
    assert!(devices.contains(&"cam0".to_string()));
}

#[tokio::test]
async fn writer_refusal_keeps_capture_running() {
    let host = SyntheticHost::new().with_cadence(CADENCE);
    let (controller, probe) = controller_with(host, RefusingWriter);

    controller.configure(output_path()).await.unwrap();
    controller.start().await.unwrap();

    // The failure is reported once, immediately, with no started event.
    let early = probe.events();
    assert!(early.contains(&Event::Finished { failed: true }));
    assert!(!early.contains(&Event::Started));

    tokio::time::sleep(CAPTURE_WINDOW).await;
    assert_eq!(controller.phase().await, SessionPhase::Running);
    assert!(!controller.is_recording().await);

    controller.stop().await.unwrap();

    let events = probe.events();
    let finished = events
        .iter()
        .filter(|e| matches!(e, Event::Finished { .. }))
        .count();
    assert_eq!(finished, 1, "stop must not emit a second finished event");
    assert!(
        events.iter().any(|e| matches!(e, Event::Video { .. })),
        "capture should keep flowing without a writer"
    );
}

#[tokio::test]
async fn attach_failure_rolls_back_to_configured() {
    let host = SyntheticHost::new()
        .with_cadence(CADENCE)
        .failing_device("mic0");
    let (controller, probe) = controller_with(host, MemoryWriter::default());

    controller.configure(output_path()).await.unwrap();
    let err = controller.start().await.unwrap_err();
    assert!(matches!(err, SessionError::Attach(_)));
    assert_eq!(controller.phase().await, SessionPhase::Configured);

    // The already-opened camera stream must be torn down by the rollback.
    tokio::time::sleep(CAPTURE_WINDOW).await;
    assert!(probe.events().is_empty());
}

#[tokio::test]
async fn stopped_session_can_record_again() {
    let host = SyntheticHost::new().with_cadence(CADENCE);
    let (controller, probe) = controller_with(host, MemoryWriter::default());

    controller.configure(output_path()).await.unwrap();
    for _ in 0..2 {
        controller.start().await.unwrap();
        tokio::time::sleep(CAPTURE_WINDOW).await;
        controller.stop().await.unwrap();
    }

    let events = probe.events();
    let started = events.iter().filter(|e| matches!(e, Event::Started)).count();
    let finished = events
        .iter()
        .filter(|e| matches!(e, Event::Finished { failed: false }))
        .count();
    assert_eq!(started, 2);
    assert_eq!(finished, 2);
}
