//! Frame log writer
//!
//! Writes every delivered frame to a flat binary log instead of encoding
//! a movie. Useful for inspecting capture output without ffmpeg installed.
//!
//! Layout: an 8-byte magic header, then one record per frame of
//! `[kind u8][sequence u64 LE][len u32 LE][payload]`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::application::ports::{MovieWriter, WriterError};
use crate::domain::device::MediaKind;
use crate::domain::frame::Frame;

pub(crate) const MAGIC: &[u8; 8] = b"CAMCLOG1";

const KIND_VIDEO: u8 = 0;
const KIND_AUDIO: u8 = 1;

/// Writer producing a raw frame log.
pub struct FrameLogWriter {
    file: Option<BufWriter<File>>,
}

impl FrameLogWriter {
    pub fn new() -> Self {
        Self { file: None }
    }
}

impl Default for FrameLogWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MovieWriter for FrameLogWriter {
    fn begin(&mut self, path: &Path) -> Result<(), WriterError> {
        let file = File::create(path).map_err(|e| WriterError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut file = BufWriter::new(file);
        file.write_all(MAGIC)
            .map_err(|e| WriterError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        self.file = Some(file);
        Ok(())
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<(), WriterError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| WriterError::WriteFailed("writer is not open".to_string()))?;

        let kind = match frame.kind {
            MediaKind::Video => KIND_VIDEO,
            MediaKind::Audio => KIND_AUDIO,
        };
        let write = |file: &mut BufWriter<File>| -> std::io::Result<()> {
            file.write_all(&[kind])?;
            file.write_all(&frame.sequence.to_le_bytes())?;
            file.write_all(&(frame.data.len() as u32).to_le_bytes())?;
            file.write_all(&frame.data)
        };
        write(file).map_err(|e| WriterError::WriteFailed(e.to_string()))
    }

    fn finish(&mut self) -> Result<(), WriterError> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| WriterError::CloseFailed("writer is not open".to_string()))?;
        file.flush()
            .map_err(|e| WriterError::CloseFailed(e.to_string()))
    }
}
