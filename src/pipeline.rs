use std::path::Path;

use anyhow::Context as _;
use image::RgbImage;

use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{TimesliceError, TimesliceResult};
use crate::output::png_file::write_png;
use crate::output::sequence::list_numbered_frames;
use crate::plane::mapper::{MappedPlane, PlaneAnimation, PlaneCorners, PlaneMapper, ResolutionPct};
use crate::raster::assembler::RasterAssembler;
use crate::sampler::cancel::CancelToken;
use crate::sampler::cursor::Cursor;
use crate::sampler::stream::{SampleStats, StreamingSampler};
use crate::schedule::scheduler::{Threading, schedule_queries};
use crate::source::ffmpeg::FfmpegSource;
use crate::source::frame::FrameSource;

/// Options shared by every sampling entry point.
#[derive(Clone, Debug, Default)]
pub struct SliceOpts {
    /// Query scheduling threads.
    pub threading: Threading,
    /// Checked before every frame read.
    pub cancel: Option<CancelToken>,
}

/// Prefix of the PNG provenance tag; the plane corners follow it.
pub const DESCRIPTION_PREFIX: &str = "Coordinates of TIMECUBE cross-section: ";

/// Provenance text stored in a cross-section PNG.
pub fn cross_section_description(corners: &PlaneCorners) -> String {
    format!("{DESCRIPTION_PREFIX}{corners}")
}

/// Sample every plane of `planes` (index = step) from `source` in one forward pass.
///
/// `source` must be unread: sampling starts at cursor `-1`.
pub fn sample_planes<S: FrameSource + ?Sized>(
    source: &mut S,
    planes: &[MappedPlane],
    opts: &SliceOpts,
) -> TimesliceResult<(Vec<RgbImage>, SampleStats)> {
    let schedule = schedule_queries(planes, &opts.threading)?;
    let mut assembler = RasterAssembler::for_planes(planes);

    let mut sampler = StreamingSampler::new(source, Cursor::new());
    if let Some(token) = &opts.cancel {
        sampler = sampler.with_cancel(token.clone());
    }
    let stats = sampler.run(&schedule, &mut assembler)?;
    Ok((assembler.finish()?, stats))
}

/// Sample one static cross-section. `corners` and `pct` are in normalized 0-100 space.
pub fn cross_section<S: FrameSource + ?Sized>(
    source: &mut S,
    corners: &PlaneCorners,
    pct: ResolutionPct,
    opts: &SliceOpts,
) -> TimesliceResult<(RgbImage, SampleStats)> {
    let plane = PlaneMapper::new(source.bounds()).map_static(corners, pct)?;
    let (mut rasters, stats) = sample_planes(source, std::slice::from_ref(&plane), opts)?;
    let raster = rasters
        .pop()
        .ok_or_else(|| TimesliceError::encode("sampling produced no raster"))?;
    Ok((raster, stats))
}

/// Sample every step of `anim`; element `i` of the result is step `i`.
pub fn animate<S: FrameSource + ?Sized>(
    source: &mut S,
    anim: &PlaneAnimation,
    pct: ResolutionPct,
    opts: &SliceOpts,
) -> TimesliceResult<(Vec<RgbImage>, SampleStats)> {
    let planes = PlaneMapper::new(source.bounds()).map_animation(anim, pct)?;
    sample_planes(source, &planes, opts)
}

/// Decode `video`, sample one cross-section and write it to `out` as a PNG.
///
/// With `tag` set, the PNG carries the normalized corners in a `Description` text chunk.
#[tracing::instrument(skip_all, fields(video = %video.display(), out = %out.display()))]
pub fn cross_section_to_png(
    video: &Path,
    corners: &PlaneCorners,
    pct: ResolutionPct,
    out: &Path,
    tag: bool,
    opts: &SliceOpts,
) -> TimesliceResult<SampleStats> {
    corners.validate()?;
    pct.validate()?;

    let mut source = FfmpegSource::open(video)?;
    let (raster, stats) = cross_section(&mut source, corners, pct, opts)?;
    let description = tag.then(|| cross_section_description(corners));
    write_png(out, &raster, description.as_deref())?;

    tracing::info!(
        width = raster.width(),
        height = raster.height(),
        frames_read = stats.frames_read,
        "wrote cross-section"
    );
    Ok(stats)
}

/// Decode `video`, sample every step of `anim` and hand the rasters to each of `sinks` in step
/// order.
///
/// Steps interleave in time, so no raster is complete before the pass ends; sinks only see data
/// after sampling succeeded.
#[tracing::instrument(skip_all, fields(video = %video.display(), steps = anim.steps))]
pub fn animation_to_sinks(
    video: &Path,
    anim: &PlaneAnimation,
    pct: ResolutionPct,
    fps: u32,
    sinks: &mut [&mut dyn FrameSink],
    opts: &SliceOpts,
) -> TimesliceResult<SampleStats> {
    anim.validate()?;
    pct.validate()?;
    if fps == 0 {
        return Err(TimesliceError::config("fps must be greater than zero"));
    }

    let mut source = FfmpegSource::open(video)?;
    let (rasters, stats) = animate(&mut source, anim, pct, opts)?;
    drop(source);
    emit_rasters(&rasters, fps, sinks)?;

    tracing::info!(
        steps = stats.steps,
        frames_read = stats.frames_read,
        "wrote animated cross-section"
    );
    Ok(stats)
}

/// Push `rasters` through every sink: `begin`, one `push_frame` per step, `end`.
///
/// If any sink fails, every sink is aborted so that no partial output set is left behind.
pub fn emit_rasters(
    rasters: &[RgbImage],
    fps: u32,
    sinks: &mut [&mut dyn FrameSink],
) -> TimesliceResult<()> {
    let Some(first) = rasters.first() else {
        return Err(TimesliceError::encode("no rasters to emit"));
    };
    let cfg = SinkConfig {
        width: first.width(),
        height: first.height(),
        fps,
    };
    let res = drive_sinks(rasters, cfg, sinks);
    if let Err(e) = &res {
        tracing::debug!(error = %e, "aborting sinks");
        for sink in sinks.iter_mut() {
            sink.abort();
        }
    }
    res
}

fn drive_sinks(
    rasters: &[RgbImage],
    cfg: SinkConfig,
    sinks: &mut [&mut dyn FrameSink],
) -> TimesliceResult<()> {
    for sink in sinks.iter_mut() {
        sink.begin(cfg)?;
    }
    for (step, raster) in rasters.iter().enumerate() {
        for sink in sinks.iter_mut() {
            sink.push_frame(step as u32, raster)?;
        }
    }
    for sink in sinks.iter_mut() {
        sink.end()?;
    }
    Ok(())
}

/// Encode the numbered PNGs in `dir` into a video at `out`. Returns the number of frames.
///
/// Frames are ordered by the integer suffix of their names and must all share the first
/// frame's dimensions.
#[tracing::instrument(skip_all, fields(dir = %dir.display(), out = %out.display(), fps = fps))]
pub fn frames_to_video(dir: &Path, out: &Path, fps: u32, overwrite: bool) -> TimesliceResult<usize> {
    if fps == 0 {
        return Err(TimesliceError::config("fps must be greater than zero"));
    }
    let frames = list_numbered_frames(dir)?;
    let Some(first) = frames.first() else {
        return Err(TimesliceError::config(format!(
            "no numbered PNG frames in '{}'",
            dir.display()
        )));
    };
    let first = load_rgb(first)?;
    let (width, height) = first.dimensions();

    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        out_path: out.to_path_buf(),
        overwrite,
    });
    sink.begin(SinkConfig { width, height, fps })?;
    sink.push_frame(0, &first)?;
    for (i, path) in frames.iter().enumerate().skip(1) {
        let img = load_rgb(path)?;
        if img.dimensions() != (width, height) {
            return Err(TimesliceError::encode(format!(
                "frame '{}' is {}x{}, expected {width}x{height}",
                path.display(),
                img.width(),
                img.height()
            )));
        }
        sink.push_frame(i as u32, &img)?;
    }
    sink.end()?;

    tracing::info!(frames = frames.len(), "encoded frame sequence");
    Ok(frames.len())
}

fn load_rgb(path: &Path) -> TimesliceResult<RgbImage> {
    let img = image::open(path).with_context(|| format!("read frame '{}'", path.display()))?;
    Ok(img.to_rgb8())
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
