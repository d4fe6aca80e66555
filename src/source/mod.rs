pub(crate) mod ffmpeg;
pub(crate) mod frame;
pub(crate) mod memory;
