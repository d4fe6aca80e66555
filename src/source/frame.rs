use image::RgbImage;

use crate::foundation::core::{ChannelOrder, VolumeBounds};
use crate::foundation::error::{TimesliceError, TimesliceResult};

/// One decoded frame: packed 3-byte pixels, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channel layout of `data`.
    pub order: ChannelOrder,
    /// `width * height * 3` bytes.
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap raw pixel data, checking its length.
    pub fn new(width: u32, height: u32, order: ChannelOrder, data: Vec<u8>) -> TimesliceResult<Self> {
        let expected = frame_len(width, height);
        if data.len() != expected {
            return Err(TimesliceError::decode(format!(
                "frame data has {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            order,
            data,
        })
    }

    /// Convert to the canonical RGB order in one pass over the buffer.
    pub fn into_rgb(self) -> TimesliceResult<RgbImage> {
        let Self {
            width,
            height,
            order,
            mut data,
        } = self;
        if order == ChannelOrder::Bgr {
            for px in data.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
        }
        RgbImage::from_raw(width, height, data)
            .ok_or_else(|| TimesliceError::decode("frame buffer does not match its dimensions"))
    }
}

/// Byte length of one packed 3-channel frame.
pub fn frame_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

/// A forward-only sequence of video frames.
///
/// Ordering contract: `next_frame` yields frames in increasing frame-index order, starting at
/// frame 0, and never rewinds. `Ok(None)` means the stream has ended.
pub trait FrameSource {
    /// Coordinate domain as reported by the source before decoding. `frame_count` may be stale;
    /// consumers must still handle an early end of stream.
    fn bounds(&self) -> VolumeBounds;

    /// Decode and return the next frame.
    fn next_frame(&mut self) -> TimesliceResult<Option<Frame>>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn bounds(&self) -> VolumeBounds {
        (**self).bounds()
    }

    fn next_frame(&mut self) -> TimesliceResult<Option<Frame>> {
        (**self).next_frame()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn bounds(&self) -> VolumeBounds {
        (**self).bounds()
    }

    fn next_frame(&mut self) -> TimesliceResult<Option<Frame>> {
        (**self).next_frame()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/frame.rs"]
mod tests;
