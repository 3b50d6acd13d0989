//! Movie writer port interface

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::frame::Frame;

/// Writer errors
#[derive(Debug, Clone, Error)]
pub enum WriterError {
    #[error("Failed to open output {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Failed to write frame: {0}")]
    WriteFailed(String),

    #[error("Failed to finalize output: {0}")]
    CloseFailed(String),
}

/// Port for writing captured frames to a container file.
///
/// A writer is either closed or open against one output path. `begin` opens
/// it, `finish` flushes and closes it; `write_frame` is only called between
/// the two. Calls are serialized by the caller.
pub trait MovieWriter: Send + 'static {
    /// Open the writer against the given output path.
    fn begin(&mut self, path: &Path) -> Result<(), WriterError>;

    /// Append one captured frame.
    fn write_frame(&mut self, frame: &Frame) -> Result<(), WriterError>;

    /// Flush buffered data and close the output file.
    fn finish(&mut self) -> Result<(), WriterError>;
}
