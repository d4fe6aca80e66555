use std::collections::VecDeque;

use crate::foundation::core::{ChannelOrder, Rgb8, VolumeBounds};
use crate::foundation::error::{TimesliceError, TimesliceResult};
use crate::source::frame::{Frame, FrameSource, frame_len};

/// Frame source backed by frames held in memory. Used by tests and by embedders that already
/// have decoded frames.
#[derive(Debug)]
pub struct InMemorySource {
    bounds: VolumeBounds,
    frames: VecDeque<Frame>,
    frames_read: u64,
}

impl InMemorySource {
    /// Wrap decoded frames. Every frame must be `width x height`.
    pub fn new(width: u32, height: u32, frames: Vec<Frame>) -> TimesliceResult<Self> {
        if let Some((idx, f)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.width != width || f.height != height)
        {
            return Err(TimesliceError::source_open(format!(
                "frame {idx} is {}x{}, expected {width}x{height}",
                f.width, f.height
            )));
        }
        Ok(Self {
            bounds: VolumeBounds::new(width, height, frames.len() as u64)?,
            frames: frames.into(),
            frames_read: 0,
        })
    }

    /// Synthesize `frame_count` frames from `color(x, y, frame)`, stored in `order`.
    pub fn from_fn(
        width: u32,
        height: u32,
        frame_count: u64,
        order: ChannelOrder,
        mut color: impl FnMut(u32, u32, u64) -> Rgb8,
    ) -> TimesliceResult<Self> {
        let mut frames = Vec::with_capacity(frame_count as usize);
        for z in 0..frame_count {
            let mut data = Vec::with_capacity(frame_len(width, height));
            for y in 0..height {
                for x in 0..width {
                    let c = color(x, y, z);
                    match order {
                        ChannelOrder::Rgb => data.extend_from_slice(&[c.r, c.g, c.b]),
                        ChannelOrder::Bgr => data.extend_from_slice(&[c.b, c.g, c.r]),
                    }
                }
            }
            frames.push(Frame::new(width, height, order, data)?);
        }
        Self::new(width, height, frames)
    }

    /// Override the frame count reported by [`FrameSource::bounds`], e.g. to model stale
    /// container metadata.
    pub fn with_reported_frame_count(mut self, frame_count: u64) -> Self {
        self.bounds.frame_count = frame_count;
        self
    }

    /// Frames handed out so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

impl FrameSource for InMemorySource {
    fn bounds(&self) -> VolumeBounds {
        self.bounds
    }

    fn next_frame(&mut self) -> TimesliceResult<Option<Frame>> {
        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.frames_read += 1;
        }
        Ok(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/memory.rs"]
mod tests;
