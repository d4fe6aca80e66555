use std::io::{Read, Write as _};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use image::RgbImage;

use crate::encode::sink::{FrameSink, SinkConfig, check_step_order};
use crate::foundation::error::{TimesliceError, TimesliceResult};
use crate::output::atomic::{TempFileGuard, ensure_parent_dir, temp_sibling};
use crate::source::ffmpeg::is_ffmpeg_on_path;

/// Settings for one MP4 encode.
#[derive(Clone, Debug)]
pub struct EncodeConfig {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: u32,
    /// Final output path.
    pub out_path: PathBuf,
    /// Replace `out_path` if it already exists.
    pub overwrite: bool,
}

impl EncodeConfig {
    /// Reject zero sizes and frame rates.
    pub fn validate(&self) -> TimesliceResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TimesliceError::config(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(TimesliceError::config("encode fps must be non-zero"));
        }
        Ok(())
    }
}

/// Streams rgb24 rasters into the system `ffmpeg` binary and produces an H.264 MP4.
///
/// Output goes to a hidden temporary sibling of `out_path` and is renamed into place by
/// [`FfmpegEncoder::finish`]. Dropping an unfinished encoder removes the temporary file.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    tmp: Option<TempFileGuard>,
    frames: u64,
}

impl FfmpegEncoder {
    /// Validate `cfg` and spawn `ffmpeg`.
    pub fn new(cfg: EncodeConfig) -> TimesliceResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(TimesliceError::config(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(TimesliceError::encode(
                "ffmpeg is required for video output, but was not found on PATH",
            ));
        }

        let tmp_path = temp_sibling(&cfg.out_path);
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args([
                "-y",
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "-s",
                &format!("{}x{}", cfg.width, cfg.height),
                "-r",
                &cfg.fps.to_string(),
                "-i",
                "pipe:0",
                "-an",
                // yuv420p needs even dimensions; cross-sections can be any size.
                "-vf",
                "pad=ceil(iw/2)*2:ceil(ih/2)*2",
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ])
            .arg(&tmp_path);

        let mut child = cmd.spawn().map_err(|e| {
            TimesliceError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let tmp = Some(TempFileGuard::new(tmp_path));

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TimesliceError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let stderr_drain = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                stderr.read_to_end(&mut buf)?;
                Ok(buf)
            })
        });

        Ok(Self {
            cfg,
            child,
            stdin: Some(stdin),
            stderr_drain,
            tmp,
            frames: 0,
        })
    }

    /// Append one raster.
    pub fn encode_frame(&mut self, frame: &RgbImage) -> TimesliceResult<()> {
        if frame.width() != self.cfg.width || frame.height() != self.cfg.height {
            return Err(TimesliceError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                self.cfg.width,
                self.cfg.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(TimesliceError::encode("ffmpeg encoder is already finalized"));
        };
        stdin.write_all(frame.as_raw()).map_err(|e| {
            TimesliceError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames += 1;
        Ok(())
    }

    /// Close the pipe, wait for ffmpeg and publish the output file.
    pub fn finish(mut self) -> TimesliceResult<()> {
        drop(self.stdin.take());

        let status = self.child.wait().map_err(|e| {
            TimesliceError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr = self
            .stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .and_then(Result::ok)
            .unwrap_or_default();

        if !status.success() {
            return Err(TimesliceError::encode(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        if let Some(tmp) = self.tmp.take() {
            tmp.publish(&self.cfg.out_path)?;
        }
        tracing::info!(
            out = %self.cfg.out_path.display(),
            frames = self.frames,
            fps = self.cfg.fps,
            "wrote video"
        );
        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if self.stdin.take().is_some() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output video path.
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
}

impl FfmpegSinkOpts {
    /// Options for writing to `out_path`, overwriting existing files.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
        }
    }
}

/// [`FrameSink`] that encodes rasters into a video through [`FfmpegEncoder`].
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    encoder: Option<FfmpegEncoder>,
    last_step: Option<u32>,
}

impl FfmpegSink {
    /// Create a sink; ffmpeg is spawned in `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            encoder: None,
            last_step: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> TimesliceResult<()> {
        if self.encoder.is_some() {
            return Err(TimesliceError::encode("ffmpeg sink already started"));
        }
        self.encoder = Some(FfmpegEncoder::new(EncodeConfig {
            width: cfg.width,
            height: cfg.height,
            fps: cfg.fps,
            out_path: self.opts.out_path.clone(),
            overwrite: self.opts.overwrite,
        })?);
        self.last_step = None;
        Ok(())
    }

    fn push_frame(&mut self, step: u32, frame: &RgbImage) -> TimesliceResult<()> {
        check_step_order(self.last_step, step)?;
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| TimesliceError::encode("ffmpeg sink used before begin"))?;
        encoder.encode_frame(frame)?;
        self.last_step = Some(step);
        Ok(())
    }

    fn end(&mut self) -> TimesliceResult<()> {
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| TimesliceError::encode("ffmpeg sink ended before begin"))?;
        encoder.finish()
    }

    fn abort(&mut self) {
        // Dropping an unfinished encoder kills ffmpeg and removes the temporary file.
        self.encoder = None;
        self.last_step = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
