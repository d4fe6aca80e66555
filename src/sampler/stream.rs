use image::RgbImage;

use crate::foundation::core::{Rgb8, VolumeBounds, Voxel};
use crate::foundation::error::{TimesliceError, TimesliceResult};
use crate::raster::assembler::RasterAssembler;
use crate::sampler::cancel::CancelToken;
use crate::sampler::cursor::Cursor;
use crate::schedule::scheduler::QuerySchedule;
use crate::source::frame::{Frame, FrameSource};

/// Counters for one sampling run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SampleStats {
    /// Rasters produced.
    pub steps: u32,
    /// Queries resolved.
    pub queries: u64,
    /// Queries resolved to black because they fell outside the volume.
    pub out_of_bounds: u64,
    /// Frames pulled from the source.
    pub frames_read: u64,
    /// Cursor position after the run.
    pub final_cursor: i64,
}

/// Resolves time-ordered sample queries against a forward-only frame source.
///
/// The sampler is the only component that advances the source. It holds at most one decoded
/// frame, converted to RGB once when it becomes current, and never moves its [`Cursor`]
/// backwards. Queries outside the volume resolve to black without touching the cursor.
pub struct StreamingSampler<'s, S: FrameSource + ?Sized> {
    source: &'s mut S,
    bounds: VolumeBounds,
    cursor: Cursor,
    current: Option<RgbImage>,
    cancel: Option<CancelToken>,
}

impl<'s, S: FrameSource + ?Sized> StreamingSampler<'s, S> {
    /// Sampler reading from `source`, starting at `cursor`.
    ///
    /// `cursor` must describe how many frames have already been taken from `source`; use
    /// [`Cursor::new`] for a fresh source.
    pub fn new(source: &'s mut S, cursor: Cursor) -> Self {
        let bounds = source.bounds();
        Self {
            source,
            bounds,
            cursor,
            current: None,
            cancel: None,
        }
    }

    /// Check `token` before every frame read.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Current read position.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Release the sampler and hand back its cursor.
    pub fn into_cursor(self) -> Cursor {
        self.cursor
    }

    /// Resolve the color of one voxel, advancing the source as far as `coord.z`.
    ///
    /// Calls must come in non-decreasing `coord.z` order for in-volume voxels.
    pub fn resolve(&mut self, coord: Voxel) -> TimesliceResult<Rgb8> {
        if !self.bounds.contains(coord) {
            return Ok(Rgb8::BLACK);
        }
        if coord.z < self.cursor.position() {
            return Err(TimesliceError::config(format!(
                "queries must be ordered by frame index: frame {} requested after frame {}",
                coord.z,
                self.cursor.position()
            )));
        }
        while self.cursor.is_before(coord.z) {
            let frame = self.advance(coord.z)?;
            if !self.cursor.is_before(coord.z) {
                self.current = Some(frame.into_rgb()?);
            }
        }

        let frame = self.current.as_ref().ok_or_else(|| {
            TimesliceError::decode(format!("no frame buffered at cursor {}", coord.z))
        })?;
        let px = frame
            .get_pixel_checked(coord.x as u32, coord.y as u32)
            .ok_or_else(|| {
                TimesliceError::decode(format!(
                    "pixel ({}, {}) missing from frame {}",
                    coord.x, coord.y, coord.z
                ))
            })?;
        Ok(Rgb8::new(px[0], px[1], px[2]))
    }

    /// Resolve every query of `schedule` into `assembler` in one forward pass.
    #[tracing::instrument(skip_all, fields(queries = schedule.len(), steps = schedule.steps()))]
    pub fn run(
        &mut self,
        schedule: &QuerySchedule,
        assembler: &mut RasterAssembler,
    ) -> TimesliceResult<SampleStats> {
        let start = self.cursor;
        let mut stats = SampleStats {
            steps: schedule.steps(),
            ..SampleStats::default()
        };

        for query in schedule.queries() {
            if !self.bounds.contains(query.coord) {
                stats.out_of_bounds += 1;
            }
            let color = self.resolve(query.coord)?;
            assembler.write(query, color)?;
            stats.queries += 1;
        }

        stats.frames_read = self.cursor.frames_read() - start.frames_read();
        stats.final_cursor = self.cursor.position();
        tracing::debug!(
            frames_read = stats.frames_read,
            out_of_bounds = stats.out_of_bounds,
            "sampling pass complete"
        );
        Ok(stats)
    }

    /// Pull the next raw frame. Frames skipped on the way to `requested` are never converted.
    fn advance(&mut self, requested: i64) -> TimesliceResult<Frame> {
        if let Some(token) = &self.cancel
            && token.is_cancelled()
        {
            return Err(TimesliceError::Cancelled {
                frames_read: self.cursor.frames_read(),
            });
        }

        // Drop the old buffer before decoding so only one frame is alive at a time.
        self.current = None;
        let Some(frame) = self.source.next_frame()? else {
            return Err(TimesliceError::StreamExhausted {
                requested: requested as u64,
                frames_read: self.cursor.frames_read(),
            });
        };
        if frame.width != self.bounds.width || frame.height != self.bounds.height {
            return Err(TimesliceError::decode(format!(
                "frame {} is {}x{}, source reported {}x{}",
                self.cursor.position() + 1,
                frame.width,
                frame.height,
                self.bounds.width,
                self.bounds.height
            )));
        }
        self.cursor.advance();
        Ok(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sampler/stream.rs"]
mod tests;
