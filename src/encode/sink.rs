use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::foundation::error::{TimesliceError, TimesliceResult};
use crate::output::png_file::write_png;
use crate::output::sequence::frame_file_name;

/// Configuration provided to a [`FrameSink`] before the first raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Playback rate for video sinks.
    pub fps: u32,
}

/// Consumer of cross-section rasters in step order.
///
/// Ordering contract: `push_frame` is called with strictly increasing `step`.
pub trait FrameSink {
    /// Called once before any raster is pushed.
    fn begin(&mut self, cfg: SinkConfig) -> TimesliceResult<()>;
    /// Push the raster of one step.
    fn push_frame(&mut self, step: u32, frame: &RgbImage) -> TimesliceResult<()>;
    /// Called once after the last raster.
    fn end(&mut self) -> TimesliceResult<()>;
    /// Discard everything written since `begin`. Called when any sink of the same run failed.
    fn abort(&mut self) {}
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u32, RgbImage)>,
    ended: bool,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Rasters in the order they were pushed.
    pub fn frames(&self) -> &[(u32, RgbImage)] {
        &self.frames
    }

    /// `true` once `end` was called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> TimesliceResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, step: u32, frame: &RgbImage) -> TimesliceResult<()> {
        self.frames.push((step, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> TimesliceResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Writes each raster to `<dir>/<base>_<step>.png`.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    base: String,
    written: Vec<PathBuf>,
    last_step: Option<u32>,
}

impl PngSequenceSink {
    /// Sink writing into `dir` with file names starting with `base`.
    pub fn new(dir: impl Into<PathBuf>, base: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base: base.into(),
            written: Vec::new(),
            last_step: None,
        }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far, in step order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, _cfg: SinkConfig) -> TimesliceResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            TimesliceError::encode(format!(
                "failed to create frame directory '{}': {e}",
                self.dir.display()
            ))
        })?;
        self.written.clear();
        self.last_step = None;
        Ok(())
    }

    fn push_frame(&mut self, step: u32, frame: &RgbImage) -> TimesliceResult<()> {
        check_step_order(self.last_step, step)?;
        let path = self.dir.join(frame_file_name(&self.base, step));
        write_png(&path, frame, None)?;
        self.written.push(path);
        self.last_step = Some(step);
        Ok(())
    }

    fn end(&mut self) -> TimesliceResult<()> {
        tracing::info!(
            dir = %self.dir.display(),
            frames = self.written.len(),
            "wrote frame sequence"
        );
        Ok(())
    }

    fn abort(&mut self) {
        for path in self.written.drain(..) {
            let _ = std::fs::remove_file(path);
        }
        self.last_step = None;
        tracing::debug!(dir = %self.dir.display(), "discarded frame sequence");
    }
}

pub(crate) fn check_step_order(last: Option<u32>, step: u32) -> TimesliceResult<()> {
    if let Some(last) = last
        && step <= last
    {
        return Err(TimesliceError::encode(format!(
            "frames must be pushed in increasing step order (got {step} after {last})"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
