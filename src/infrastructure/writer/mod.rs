//! Movie writer adapters

pub mod ffmpeg;
pub mod frame_log;

pub use ffmpeg::FfmpegMovieWriter;
pub use frame_log::FrameLogWriter;
