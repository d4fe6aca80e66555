//! Timeslice samples 2D cross-sections out of a video treated as a 3D volume `(x, y, time)`.
//!
//! A plane is described by three corners in a normalized 0-100 space. Every output pixel maps to
//! one voxel; the voxels of all requested planes are ordered by frame index and resolved in a
//! single forward pass over the decoded video, so the source is never seeked or rewound.
//!
//! - Describe the plane with [`PlaneCorners`] (or a [`PlaneAnimation`] for a moving plane)
//! - Open a [`FrameSource`] such as [`FfmpegSource`]
//! - Sample with [`cross_section`] / [`animate`], or write files directly with
//!   [`cross_section_to_png`] / [`animation_to_sinks`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod config;
pub(crate) mod encode;
pub(crate) mod output;
pub(crate) mod pipeline;
pub(crate) mod plane;
pub(crate) mod raster;
pub(crate) mod sampler;
pub(crate) mod schedule;
pub(crate) mod source;

pub use crate::foundation::core::{ChannelOrder, Point3, Resolution, Rgb8, VolumeBounds, Voxel};
pub use crate::foundation::error::{TimesliceError, TimesliceResult};

pub use crate::config::job::{AnimationJob, ImageJob, SliceJob};
pub use crate::encode::ffmpeg::{EncodeConfig, FfmpegEncoder, FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{FrameSink, InMemorySink, PngSequenceSink, SinkConfig};
pub use crate::output::atomic::ensure_parent_dir;
pub use crate::output::png_file::{DESCRIPTION_KEY, read_png_description, write_png};
pub use crate::output::sequence::{frame_file_name, frame_number, list_numbered_frames};
pub use crate::pipeline::{
    DESCRIPTION_PREFIX, SliceOpts, animate, animation_to_sinks, cross_section,
    cross_section_description, cross_section_to_png, emit_rasters, frames_to_video, sample_planes,
};
pub use crate::plane::mapper::{
    MappedPlane, PlaneAnimation, PlaneCorners, PlaneMapper, ResolutionPct,
};
pub use crate::raster::assembler::RasterAssembler;
pub use crate::sampler::cancel::CancelToken;
pub use crate::sampler::cursor::Cursor;
pub use crate::sampler::stream::{SampleStats, StreamingSampler};
pub use crate::schedule::scheduler::{QuerySchedule, SampleQuery, Threading, schedule_queries};
pub use crate::source::ffmpeg::{FfmpegSource, is_ffmpeg_on_path, probe_bounds};
pub use crate::source::frame::{Frame, FrameSource, frame_len};
pub use crate::source::memory::InMemorySource;
