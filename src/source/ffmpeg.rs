use std::ffi::OsString;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use crate::foundation::core::{ChannelOrder, VolumeBounds};
use crate::foundation::error::{TimesliceError, TimesliceResult};
use crate::source::frame::{Frame, FrameSource, frame_len};

/// Sequential video source backed by the system `ffprobe` and `ffmpeg` binaries.
///
/// Bounds are probed when the source is opened. The decoder process is spawned lazily on the
/// first [`FrameSource::next_frame`] call and streams `rgb24` rawvideo over a pipe, so a run that
/// fails configuration checks never starts decoding. Frames pass through without frame rate
/// conversion: variable frame rate input is neither padded with duplicates nor thinned. The
/// process is killed when the source is dropped, on every exit path.
pub struct FfmpegSource {
    path: PathBuf,
    bounds: VolumeBounds,
    decoder: Option<Decoder>,
    finished: bool,
}

struct Decoder {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl FfmpegSource {
    /// Check that `path` exists and probe its dimensions and frame count.
    #[tracing::instrument]
    pub fn open(path: &Path) -> TimesliceResult<Self> {
        if !path.is_file() {
            return Err(TimesliceError::source_open(format!(
                "video file does not exist: '{}'",
                path.display()
            )));
        }
        let bounds = probe_bounds(path)?;
        tracing::info!(
            width = bounds.width,
            height = bounds.height,
            frames = bounds.frame_count,
            "opened video source"
        );
        Ok(Self {
            path: path.to_path_buf(),
            bounds,
            decoder: None,
            finished: false,
        })
    }

    /// Path of the underlying video file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn spawn_decoder(&self) -> TimesliceResult<Decoder> {
        let mut child = Command::new("ffmpeg")
            .args(decoder_args(&self.path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TimesliceError::source_open(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TimesliceError::source_open("failed to open ffmpeg stdout"))?;
        let stderr_drain = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                stderr.read_to_end(&mut buf)?;
                Ok(buf)
            })
        });

        Ok(Decoder {
            child,
            stdout: BufReader::with_capacity(
                frame_len(self.bounds.width, self.bounds.height),
                stdout,
            ),
            stderr_drain,
        })
    }

    fn finish_decoder(&mut self) -> TimesliceResult<()> {
        self.finished = true;
        let Some(mut dec) = self.decoder.take() else {
            return Ok(());
        };
        let status = dec
            .child
            .wait()
            .map_err(|e| TimesliceError::decode(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr = dec
            .stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .and_then(Result::ok)
            .unwrap_or_default();
        if !status.success() {
            return Err(TimesliceError::decode(format!(
                "ffmpeg decode of '{}' exited with status {status}: {}",
                self.path().display(),
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(())
    }
}

impl FrameSource for FfmpegSource {
    fn bounds(&self) -> VolumeBounds {
        self.bounds
    }

    fn next_frame(&mut self) -> TimesliceResult<Option<Frame>> {
        if self.finished {
            return Ok(None);
        }
        if self.decoder.is_none() {
            self.decoder = Some(self.spawn_decoder()?);
        }
        let Some(dec) = self.decoder.as_mut() else {
            return Ok(None);
        };

        let mut data = vec![0u8; frame_len(self.bounds.width, self.bounds.height)];
        let filled = read_full(&mut dec.stdout, &mut data)
            .map_err(|e| TimesliceError::decode(format!("failed to read from ffmpeg: {e}")))?;

        if filled == 0 {
            self.finish_decoder()?;
            return Ok(None);
        }
        if filled < data.len() {
            return Err(TimesliceError::decode(format!(
                "ffmpeg produced a truncated frame: {filled} of {} bytes",
                data.len()
            )));
        }
        Frame::new(
            self.bounds.width,
            self.bounds.height,
            ChannelOrder::Rgb,
            data,
        )
        .map(Some)
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        if let Some(mut dec) = self.decoder.take() {
            let _ = dec.child.kill();
            let _ = dec.child.wait();
        }
    }
}

/// Arguments of the rawvideo decode. `-fps_mode passthrough` emits every decoded frame exactly
/// once, so frame `z` of the pipe is the `z`-th frame of the stream even for variable frame rate
/// input.
pub(crate) fn decoder_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-nostdin", "-noautorotate", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_os_string());
    args.extend(
        [
            "-map",
            "0:v:0",
            "-fps_mode",
            "passthrough",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "pipe:1",
        ]
        .into_iter()
        .map(OsString::from),
    );
    args
}

/// Fill `buf` until it is full or the reader hits EOF; returns the number of bytes read.
fn read_full(r: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// `true` if both `ffmpeg` and `ffprobe` can be executed.
pub fn is_ffmpeg_on_path() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        Command::new(tool)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

/// Read width, height and frame count of the first video stream in `path`.
pub fn probe_bounds(path: &Path) -> TimesliceResult<VolumeBounds> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-count_packets",
            "-show_entries",
            "stream=width,height,nb_frames,nb_read_packets",
            "-print_format",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| {
            TimesliceError::source_open(format!(
                "failed to run ffprobe (is it installed and on PATH?): {e}"
            ))
        })?;
    if !out.status.success() {
        return Err(TimesliceError::source_open(format!(
            "could not open '{}' as a video: {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_output(&out.stdout)
}

pub(crate) fn parse_probe_output(json: &[u8]) -> TimesliceResult<VolumeBounds> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        width: Option<u32>,
        height: Option<u32>,
        nb_frames: Option<String>,
        nb_read_packets: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| TimesliceError::source_open(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .first()
        .ok_or_else(|| TimesliceError::source_open("no video stream found"))?;
    let width = stream
        .width
        .ok_or_else(|| TimesliceError::source_open("missing video width from ffprobe"))?;
    let height = stream
        .height
        .ok_or_else(|| TimesliceError::source_open("missing video height from ffprobe"))?;

    let parse_count = |s: &Option<String>| s.as_deref().and_then(|v| v.parse::<u64>().ok());
    let frame_count = parse_count(&stream.nb_frames)
        .filter(|&n| n > 0)
        .or_else(|| parse_count(&stream.nb_read_packets))
        .ok_or_else(|| TimesliceError::source_open("could not determine video frame count"))?;

    VolumeBounds::new(width, height, frame_count)
}

#[cfg(test)]
#[path = "../../tests/unit/source/ffmpeg.rs"]
mod tests;
