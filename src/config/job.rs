use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{FrameSink, PngSequenceSink};
use crate::foundation::error::{TimesliceError, TimesliceResult};
use crate::pipeline::{SliceOpts, animation_to_sinks, cross_section_to_png};
use crate::plane::mapper::{PlaneAnimation, PlaneCorners, ResolutionPct};
use crate::sampler::stream::SampleStats;

/// A complete sampling job, as stored in a JSON file.
///
/// ```json
/// { "mode": "image", "video": "in.mp4",
///   "points": [[0,0,0],[100,0,0],[0,100,0]], "output": "slice.png" }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SliceJob {
    /// One static cross-section written as a PNG.
    Image(ImageJob),
    /// A plane animated between two positions.
    Animation(AnimationJob),
}

/// Static cross-section job.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageJob {
    /// Input video.
    pub video: PathBuf,
    /// Plane corners in normalized 0-100 space.
    pub points: PlaneCorners,
    /// Output resolution as a percentage of the frame size.
    #[serde(default = "ResolutionPct::full")]
    pub resolution: ResolutionPct,
    /// Output PNG.
    pub output: PathBuf,
    /// Embed the sampling coordinates as a PNG `Description` chunk.
    #[serde(default = "default_true")]
    pub tag_metadata: bool,
}

/// Animated cross-section job.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimationJob {
    /// Input video.
    pub video: PathBuf,
    /// Corners at the first step, normalized 0-100 space.
    pub points: PlaneCorners,
    /// Corners at the last step, normalized 0-100 space.
    pub end_points: PlaneCorners,
    /// Number of steps (output frames), at least 2.
    #[serde(default = "default_steps")]
    pub steps: u32,
    /// Output resolution as a percentage of the frame size.
    #[serde(default = "default_animation_resolution")]
    pub resolution: ResolutionPct,
    /// Frame rate of the encoded video.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Encoded video output.
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Directory receiving one numbered PNG per step.
    #[serde(default)]
    pub frames_dir: Option<PathBuf>,
    /// File name prefix of the numbered PNGs.
    #[serde(default = "default_frame_base")]
    pub frame_base: String,
}

fn default_true() -> bool {
    true
}

fn default_steps() -> u32 {
    30
}

fn default_fps() -> u32 {
    15
}

fn default_animation_resolution() -> ResolutionPct {
    ResolutionPct::new(50.0, 50.0)
}

fn default_frame_base() -> String {
    "timeslice".to_string()
}

impl AnimationJob {
    /// The plane animation this job describes.
    pub fn animation(&self) -> TimesliceResult<PlaneAnimation> {
        PlaneAnimation::new(self.points, self.end_points, self.steps)
    }
}

impl SliceJob {
    /// Parse a job from JSON text.
    pub fn from_json(json: &str) -> TimesliceResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| TimesliceError::config(format!("invalid job JSON: {e}")))
    }

    /// Load a job file. Relative paths inside it resolve against the file's directory.
    pub fn from_path(path: &Path) -> TimesliceResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read job file '{}'", path.display()))?;
        let mut job = Self::from_json(&text)?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        job.resolve_paths(root);
        Ok(job)
    }

    /// Checks that need no IO: step count, finite corners, positive resolution, fps, outputs.
    pub fn validate(&self) -> TimesliceResult<()> {
        match self {
            Self::Image(job) => {
                job.points.validate()?;
                job.resolution.validate()
            }
            Self::Animation(job) => {
                job.animation()?;
                job.resolution.validate()?;
                if job.fps == 0 {
                    return Err(TimesliceError::config("fps must be greater than zero"));
                }
                if job.output.is_none() && job.frames_dir.is_none() {
                    return Err(TimesliceError::config(
                        "animation job needs an output video, a frames directory, or both",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Validate, then sample and write every output the job names.
    pub fn run(&self, opts: &SliceOpts) -> TimesliceResult<SampleStats> {
        self.validate()?;
        match self {
            Self::Image(job) => cross_section_to_png(
                &job.video,
                &job.points,
                job.resolution,
                &job.output,
                job.tag_metadata,
                opts,
            ),
            Self::Animation(job) => {
                let mut frames = job
                    .frames_dir
                    .as_ref()
                    .map(|dir| PngSequenceSink::new(dir, job.frame_base.clone()));
                let mut video = job
                    .output
                    .as_ref()
                    .map(|out| FfmpegSink::new(FfmpegSinkOpts::new(out)));

                let mut sinks: Vec<&mut dyn FrameSink> = Vec::new();
                if let Some(sink) = frames.as_mut() {
                    sinks.push(sink);
                }
                if let Some(sink) = video.as_mut() {
                    sinks.push(sink);
                }
                animation_to_sinks(
                    &job.video,
                    &job.animation()?,
                    job.resolution,
                    job.fps,
                    &mut sinks,
                    opts,
                )
            }
        }
    }

    fn resolve_paths(&mut self, root: &Path) {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = root.join(&*p);
            }
        };
        match self {
            Self::Image(job) => {
                fix(&mut job.video);
                fix(&mut job.output);
            }
            Self::Animation(job) => {
                fix(&mut job.video);
                if let Some(out) = job.output.as_mut() {
                    fix(out);
                }
                if let Some(dir) = job.frames_dir.as_mut() {
                    fix(dir);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/job.rs"]
mod tests;
