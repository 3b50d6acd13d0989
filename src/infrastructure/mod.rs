//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like cpal, nokhwa, and ffmpeg.

pub mod config;
pub mod host;
pub mod observer;
pub mod synthetic;
pub mod writer;

// Re-export adapters
pub use config::XdgConfigStore;
pub use host::{HostCapture, HostEnumerator};
pub use observer::LogSink;
pub use synthetic::{SyntheticEnumerator, SyntheticHost};
pub use writer::{FfmpegMovieWriter, FrameLogWriter};
