//! Movie writer that muxes through an ffmpeg child process
//!
//! Raw frame payloads are spooled to temp files while the recording runs,
//! then handed to ffmpeg in a single mux pass when the recording closes.
//! Spooling keeps `write_frame` cheap and means a crashed ffmpeg cannot
//! take a half-written recording down with it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use tracing::{debug, warn};

use crate::application::ports::{MovieWriter, WriterError};
use crate::domain::frame::{Frame, FrameInfo, SampleFormat};

const FALLBACK_FPS: u32 = 30;

/// Writer producing an H.264 MP4 via ffmpeg.
pub struct FfmpegMovieWriter {
    stabilize: bool,
    state: Option<Spool>,
}

struct Spool {
    output: PathBuf,
    video_path: PathBuf,
    audio_path: PathBuf,
    video_file: BufWriter<File>,
    audio_file: BufWriter<File>,
    video_size: Option<(u32, u32)>,
    audio_format: Option<(u32, u16, SampleFormat)>,
    video_frames: u64,
    first_video: Option<Instant>,
    last_video: Option<Instant>,
}

impl FfmpegMovieWriter {
    pub fn new() -> Self {
        Self {
            stabilize: false,
            state: None,
        }
    }

    /// Apply ffmpeg's deshake filter during the mux pass.
    pub fn with_stabilization(mut self, stabilize: bool) -> Self {
        self.stabilize = stabilize;
        self
    }

    fn spool_path(suffix: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!(
            "camclip-{}-{}.{}",
            std::process::id(),
            nanos,
            suffix
        ))
    }
}

impl Default for FfmpegMovieWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MovieWriter for FfmpegMovieWriter {
    fn begin(&mut self, path: &Path) -> Result<(), WriterError> {
        let probe = Command::new("ffmpeg").arg("-version").output();
        if probe.is_err() {
            return Err(WriterError::OpenFailed {
                path: path.to_path_buf(),
                reason: "ffmpeg not found on PATH".to_string(),
            });
        }

        let video_path = Self::spool_path("video.raw");
        let audio_path = Self::spool_path("audio.raw");
        let open = |p: &Path| -> Result<BufWriter<File>, WriterError> {
            File::create(p)
                .map(BufWriter::new)
                .map_err(|e| WriterError::OpenFailed {
                    path: path.to_path_buf(),
                    reason: format!("spool file {}: {}", p.display(), e),
                })
        };
        let video_file = open(&video_path)?;
        let audio_file = open(&audio_path)?;

        debug!(output = %path.display(), "recording spool opened");
        self.state = Some(Spool {
            output: path.to_path_buf(),
            video_path,
            audio_path,
            video_file,
            audio_file,
            video_size: None,
            audio_format: None,
            video_frames: 0,
            first_video: None,
            last_video: None,
        });
        Ok(())
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<(), WriterError> {
        let spool = self
            .state
            .as_mut()
            .ok_or_else(|| WriterError::WriteFailed("writer is not open".to_string()))?;

        match frame.info {
            FrameInfo::Video { width, height } => {
                if let Some((w, h)) = spool.video_size {
                    // The mux pass needs one fixed geometry per file.
                    if (w, h) != (width, height) {
                        return Err(WriterError::WriteFailed(format!(
                            "video size changed from {w}x{h} to {width}x{height}"
                        )));
                    }
                } else {
                    spool.video_size = Some((width, height));
                }
                spool
                    .video_file
                    .write_all(&frame.data)
                    .map_err(|e| WriterError::WriteFailed(e.to_string()))?;
                let now = Instant::now();
                if spool.first_video.is_none() {
                    spool.first_video = Some(now);
                }
                spool.last_video = Some(now);
                spool.video_frames += 1;
            }
            FrameInfo::Audio {
                sample_rate,
                channels,
                format,
            } => {
                if spool.audio_format.is_none() {
                    spool.audio_format = Some((sample_rate, channels, format));
                }
                spool
                    .audio_file
                    .write_all(&frame.data)
                    .map_err(|e| WriterError::WriteFailed(e.to_string()))?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), WriterError> {
        let mut spool = self
            .state
            .take()
            .ok_or_else(|| WriterError::CloseFailed("writer is not open".to_string()))?;

        spool
            .video_file
            .flush()
            .map_err(|e| WriterError::CloseFailed(e.to_string()))?;
        spool
            .audio_file
            .flush()
            .map_err(|e| WriterError::CloseFailed(e.to_string()))?;

        let result = mux(&spool, self.stabilize);
        for path in [&spool.video_path, &spool.audio_path] {
            if let Err(err) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %err, "failed to remove spool file");
            }
        }
        result
    }
}

fn mux(spool: &Spool, stabilize: bool) -> Result<(), WriterError> {
    let (width, height) = spool
        .video_size
        .ok_or_else(|| WriterError::CloseFailed("no video frames captured".to_string()))?;
    let fps = estimate_fps(spool.video_frames, spool.first_video, spool.last_video);

    let args = build_mux_args(
        &spool.output,
        &spool.video_path,
        width,
        height,
        fps,
        spool
            .audio_format
            .map(|format| (spool.audio_path.as_path(), format)),
        stabilize,
    );

    debug!(output = %spool.output.display(), fps, "muxing recording");
    let output = Command::new("ffmpeg")
        .args(&args)
        .output()
        .map_err(|e| WriterError::CloseFailed(format!("failed to run ffmpeg: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(WriterError::CloseFailed(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            last_lines(&stderr, 4)
        )));
    }
    Ok(())
}

fn estimate_fps(frames: u64, first: Option<Instant>, last: Option<Instant>) -> u32 {
    match (first, last) {
        (Some(first), Some(last)) if frames > 1 => {
            let elapsed = last.duration_since(first).as_secs_f64();
            if elapsed > 0.0 {
                (((frames - 1) as f64 / elapsed).round() as u32).max(1)
            } else {
                FALLBACK_FPS
            }
        }
        _ => FALLBACK_FPS,
    }
}

/// Assemble the ffmpeg argument list for the mux pass.
fn build_mux_args(
    output: &Path,
    video_spool: &Path,
    width: u32,
    height: u32,
    fps: u32,
    audio: Option<(&Path, (u32, u16, SampleFormat))>,
    stabilize: bool,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pixel_format".into(),
        "rgba".into(),
        "-video_size".into(),
        format!("{width}x{height}"),
        "-framerate".into(),
        fps.to_string(),
        "-i".into(),
        video_spool.to_string_lossy().into_owned(),
    ];

    if let Some((audio_spool, (sample_rate, channels, format))) = audio {
        let pcm = match format {
            SampleFormat::I16 => "s16le",
            SampleFormat::F32 => "f32le",
        };
        args.extend([
            "-f".into(),
            pcm.into(),
            "-ar".into(),
            sample_rate.to_string(),
            "-ac".into(),
            channels.to_string(),
            "-i".into(),
            audio_spool.to_string_lossy().into_owned(),
        ]);
    }

    args.extend([
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "veryfast".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-crf".into(),
        "18".into(),
    ]);

    if stabilize {
        args.extend(["-vf".into(), "deshake".into()]);
    }

    if audio.is_some() {
        args.extend(["-c:a".into(), "aac".into(), "-shortest".into()]);
    }

    args.extend([
        "-movflags".into(),
        "+faststart".into(),
        output.to_string_lossy().into_owned(),
    ]);
    args
}

fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().rev().take(count).collect();
    lines.into_iter().rev().collect::<Vec<_>>().join(" | ")
}
