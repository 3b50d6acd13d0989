//! Main app runners for the devices and record commands

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Instant;

use tracing::warn;

use crate::application::ports::{
    CaptureHost, CaptureObserver, ConfigStore, DeviceEnumerator, WriterError,
};
use crate::application::SessionController;
use crate::domain::config::AppConfig;
use crate::domain::device::MediaKind;
use crate::domain::frame::Frame;
use crate::infrastructure::{
    FfmpegMovieWriter, HostCapture, HostEnumerator, LogSink, SyntheticEnumerator, SyntheticHost,
    XdgConfigStore,
};

use super::args::RecordOptions;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Default output location when neither the CLI nor the config names one.
pub fn default_output_path() -> PathBuf {
    dirs::video_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("abc.mp4")
}

/// List capture devices
pub async fn run_devices(synthetic: bool) -> ExitCode {
    let presenter = Presenter::new();
    if synthetic {
        print_devices(&SyntheticEnumerator::standard(), &presenter).await
    } else {
        print_devices(&HostEnumerator::new(), &presenter).await
    }
}

async fn print_devices<E: DeviceEnumerator>(enumerator: &E, presenter: &Presenter) -> ExitCode {
    let sections = [
        ("Cameras", MediaKind::Video),
        ("Microphones", MediaKind::Audio),
    ];
    for (label, kind) in sections {
        match enumerator.list_devices(kind).await {
            Ok(devices) => {
                presenter.info(label);
                if devices.is_empty() {
                    presenter.output("  (none)");
                }
                for device in devices {
                    presenter.output(&format!("  {}", device));
                }
            }
            Err(e) => {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
        }
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Observer for the record command.
///
/// Frame and lifecycle events flow through the log sink; the last writer
/// failure is kept so the command can exit non-zero after the session
/// shuts down cleanly.
pub struct RecordObserver {
    log: LogSink,
    failure: StdMutex<Option<WriterError>>,
}

impl RecordObserver {
    pub fn new() -> Self {
        Self {
            log: LogSink::new(),
            failure: StdMutex::new(None),
        }
    }

    pub fn failure(&self) -> Option<WriterError> {
        self.failure.lock().map(|f| f.clone()).unwrap_or(None)
    }
}

impl Default for RecordObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureObserver for RecordObserver {
    fn video_frame(&self, frame: &Frame) {
        self.log.video_frame(frame);
    }

    fn audio_frame(&self, frame: &Frame) {
        self.log.audio_frame(frame);
    }

    fn recording_started(&self, path: &Path) {
        self.log.recording_started(path);
    }

    fn recording_finished(&self, path: &Path, error: Option<WriterError>) {
        if let Ok(mut slot) = self.failure.lock() {
            *slot = error.clone();
        }
        self.log.recording_finished(path, error);
    }
}

/// Run the record command
pub async fn run_record(options: RecordOptions) -> ExitCode {
    let writer = FfmpegMovieWriter::new().with_stabilization(options.stabilize);
    let observer = Arc::new(RecordObserver::new());

    if options.synthetic {
        let controller = SessionController::new(
            SyntheticEnumerator::standard(),
            SyntheticHost::new(),
            writer,
            Arc::clone(&observer),
        );
        run_record_loop(controller, observer, options).await
    } else {
        let controller = SessionController::new(
            HostEnumerator::new(),
            HostCapture::new(),
            writer,
            Arc::clone(&observer),
        );
        run_record_loop(controller, observer, options).await
    }
}

async fn run_record_loop<E, H>(
    controller: SessionController<E, H, FfmpegMovieWriter, RecordObserver>,
    observer: Arc<RecordObserver>,
    options: RecordOptions,
) -> ExitCode
where
    E: DeviceEnumerator,
    H: CaptureHost,
{
    let mut presenter = Presenter::new();

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup().await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    if let Err(e) = controller
        .configure_facing(options.output.clone(), options.position)
        .await
    {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    if let Err(e) = controller.start().await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    presenter.show_recording_progress("Recording...");
    let total_ms = options.duration.as_millis();
    let switch_at_ms = options.switch_after.map(|d| d.as_millis());
    let mut switched = false;
    let start = Instant::now();
    let mut ticker = tokio::time::interval(std::time::Duration::from_millis(100));

    loop {
        ticker.tick().await;
        let elapsed = start.elapsed().as_millis() as u64;
        if shutdown.is_shutdown() || elapsed >= total_ms {
            break;
        }
        if let Some(at) = switch_at_ms {
            if !switched && elapsed >= at {
                switched = true;
                match controller.switch_camera().await {
                    Ok(device) => {
                        presenter.update_spinner(&format!("Switched to {}", device.name))
                    }
                    Err(e) => warn!(error = %e, "camera switch failed"),
                }
            }
        }
        presenter.update_recording_progress(elapsed.min(total_ms), total_ms);
    }

    if shutdown.is_shutdown() {
        presenter.update_spinner("Interrupted, finishing up...");
    }

    if let Err(e) = controller.stop().await {
        presenter.spinner_fail("Recording failed");
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    if let Some(err) = observer.failure() {
        presenter.spinner_fail("Recording failed");
        presenter.error(&err.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    presenter.spinner_success(&format!("Saved to {}", options.output.display()));
    ExitCode::from(EXIT_SUCCESS)
}

/// Load and merge configuration from file and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    // Merge: defaults < file < cli
    AppConfig::defaults().merge(file_config).merge(cli_config)
}
