//! Sinks for frames rendered while evaluating an agent.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::env::Frame;
use crate::error::{DqnError, Result};

pub trait FrameSink {
    fn append(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and release the sink. Further appends fail.
    fn close(&mut self) -> Result<()>;
}

/// Writes every frame as `<dir>/frame_<index>.png`, index zero-padded to
/// five digits, ready to be stitched into a video by an external tool.
#[derive(Debug)]
pub struct PngSequenceWriter {
    dir: PathBuf,
    next_index: usize,
    closed: bool,
}

impl PngSequenceWriter {
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(PngSequenceWriter {
            dir,
            next_index: 0,
            closed: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frames_written(&self) -> usize {
        self.next_index
    }
}

impl FrameSink for PngSequenceWriter {
    fn append(&mut self, frame: &Frame) -> Result<()> {
        if self.closed {
            return Err(DqnError::Image("append on a closed frame writer".to_string()));
        }
        let (height, width, channels) = frame.dim();
        if channels != 3 {
            return Err(DqnError::dimension_mismatch(
                "3 color channels".to_string(),
                format!("{} channels", channels),
            ));
        }

        let pixels: Vec<u8> = frame.iter().copied().collect();
        let image = RgbImage::from_raw(width as u32, height as u32, pixels)
            .ok_or_else(|| DqnError::Image(format!("frame of {}x{} does not fit its buffer", width, height)))?;
        image.save(self.dir.join(format!("frame_{:05}.png", self.next_index)))?;
        self.next_index += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            log::info!("Wrote {} frames to {}", self.next_index, self.dir.display());
            self.closed = true;
        }
        Ok(())
    }
}

/// Drops frames on the floor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn append(&mut self, _frame: &Frame) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
