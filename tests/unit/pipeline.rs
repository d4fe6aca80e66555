use super::*;
use crate::encode::sink::{InMemorySink, PngSequenceSink};
use crate::foundation::core::{ChannelOrder, Rgb8};
use crate::source::memory::InMemorySource;

fn xyz_source(w: u32, h: u32, frames: u64) -> InMemorySource {
    InMemorySource::from_fn(w, h, frames, ChannelOrder::Rgb, |x, y, z| {
        Rgb8::new(x as u8, y as u8, z as u8)
    })
    .unwrap()
}

fn flat(z: f64) -> PlaneCorners {
    PlaneCorners::new(
        [0.0, 0.0, z].into(),
        [100.0, 0.0, z].into(),
        [0.0, 100.0, z].into(),
    )
}

#[test]
fn cross_section_samples_cell_centers_of_one_frame() {
    let mut src = xyz_source(20, 20, 10);
    let (img, stats) = cross_section(
        &mut src,
        &flat(50.0),
        ResolutionPct::new(50.0, 50.0),
        &SliceOpts::default(),
    )
    .unwrap();

    assert_eq!(img.dimensions(), (10, 10));
    assert_eq!(stats.frames_read, 6);
    assert_eq!(stats.final_cursor, 5);
    assert_eq!(img.get_pixel(0, 0).0, [1, 1, 5]);
    assert_eq!(img.get_pixel(9, 4).0, [19, 9, 5]);
}

#[test]
fn animation_reads_each_frame_once_for_all_steps() {
    let anim = PlaneAnimation::new(flat(0.0), flat(90.0), 4).unwrap();
    let pct = ResolutionPct::new(50.0, 50.0);

    let mut serial_src = xyz_source(20, 20, 10);
    let (serial, stats) = animate(&mut serial_src, &anim, pct, &SliceOpts::default()).unwrap();
    assert_eq!(serial.len(), 4);
    assert_eq!(stats.steps, 4);
    assert_eq!(stats.frames_read, 10);
    assert_eq!(serial_src.frames_read(), 10);
    for (step, img) in serial.iter().enumerate() {
        assert_eq!(img.get_pixel(3, 3).0[2], (step * 3) as u8);
    }

    let mut parallel_src = xyz_source(20, 20, 10);
    let opts = SliceOpts {
        threading: Threading {
            parallel: true,
            threads: Some(2),
        },
        cancel: None,
    };
    let (parallel, _) = animate(&mut parallel_src, &anim, pct, &opts).unwrap();
    assert_eq!(parallel, serial);
}

#[test]
fn cancelled_token_stops_before_the_first_read() {
    let token = CancelToken::new();
    token.cancel();
    let opts = SliceOpts {
        cancel: Some(token),
        ..SliceOpts::default()
    };
    let mut src = xyz_source(4, 4, 4);
    let err = cross_section(&mut src, &flat(0.0), ResolutionPct::full(), &opts).unwrap_err();
    assert!(matches!(err, TimesliceError::Cancelled { frames_read: 0 }));
    assert_eq!(src.frames_read(), 0);
}

#[test]
fn rasters_reach_every_sink_in_step_order() {
    let rasters: Vec<RgbImage> = (0..3u8)
        .map(|i| RgbImage::from_pixel(3, 2, image::Rgb([i, i, i])))
        .collect();
    let mut a = InMemorySink::new();
    let mut b = InMemorySink::new();
    emit_rasters(&rasters, 12, &mut [&mut a, &mut b]).unwrap();

    for sink in [&a, &b] {
        assert_eq!(
            sink.config(),
            Some(SinkConfig {
                width: 3,
                height: 2,
                fps: 12
            })
        );
        let steps: Vec<u32> = sink.frames().iter().map(|(s, _)| *s).collect();
        assert_eq!(steps, vec![0, 1, 2]);
        assert_eq!(sink.frames()[2].1.get_pixel(0, 0).0, [2, 2, 2]);
        assert!(sink.is_ended());
    }

    assert!(matches!(
        emit_rasters(&[], 12, &mut [&mut InMemorySink::new()]),
        Err(TimesliceError::Encode(_))
    ));
}

/// Accepts rasters up to `fail_at`, then errors; `end` fails when `fail_at` is past the last step.
struct FailingSink {
    fail_at: u32,
    aborted: bool,
}

impl FrameSink for FailingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> TimesliceResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, step: u32, _frame: &RgbImage) -> TimesliceResult<()> {
        if step >= self.fail_at {
            return Err(TimesliceError::encode("encoder died"));
        }
        Ok(())
    }

    fn end(&mut self) -> TimesliceResult<()> {
        Err(TimesliceError::encode("encoder could not finalize"))
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

#[test]
fn failing_sink_discards_frame_sequence() {
    let rasters: Vec<RgbImage> = (0..3).map(|_| RgbImage::new(2, 2)).collect();

    for fail_at in [1, 3] {
        let dir = Path::new("target").join(format!("pipeline_abort_{fail_at}"));
        let _ = std::fs::remove_dir_all(&dir);
        let mut frames = PngSequenceSink::new(&dir, "step");
        let mut video = FailingSink {
            fail_at,
            aborted: false,
        };

        let err = emit_rasters(&rasters, 15, &mut [&mut frames, &mut video]).unwrap_err();
        assert!(matches!(err, TimesliceError::Encode(_)));
        assert!(video.aborted);
        assert!(frames.written().is_empty());
        assert_eq!(frames.dir(), dir.as_path());
        assert!(list_numbered_frames(&dir).unwrap().is_empty());
    }
}

#[test]
fn description_lists_normalized_corners() {
    assert_eq!(
        cross_section_description(&flat(25.5)),
        "Coordinates of TIMECUBE cross-section: [[0, 0, 25.5], [100, 0, 25.5], [0, 100, 25.5]]"
    );
}

#[test]
fn configuration_is_checked_before_the_video_is_opened() {
    let missing = Path::new("target/does-not-exist.mp4");
    let out = Path::new("target/never-written.png");

    let err = cross_section_to_png(
        missing,
        &flat(0.0),
        ResolutionPct::new(0.0, 50.0),
        out,
        true,
        &SliceOpts::default(),
    )
    .unwrap_err();
    assert!(matches!(err, TimesliceError::Config(_)));

    let err = cross_section_to_png(
        missing,
        &flat(0.0),
        ResolutionPct::full(),
        out,
        true,
        &SliceOpts::default(),
    )
    .unwrap_err();
    assert!(matches!(err, TimesliceError::SourceOpen(_)));
    assert!(!out.exists());

    let anim = PlaneAnimation {
        start: flat(0.0),
        end: flat(10.0),
        steps: 1,
    };
    let err = animation_to_sinks(
        missing,
        &anim,
        ResolutionPct::full(),
        15,
        &mut [],
        &SliceOpts::default(),
    )
    .unwrap_err();
    assert!(matches!(err, TimesliceError::Config(_)));

    let anim = PlaneAnimation::new(flat(0.0), flat(10.0), 2).unwrap();
    let err = animation_to_sinks(
        missing,
        &anim,
        ResolutionPct::full(),
        0,
        &mut [],
        &SliceOpts::default(),
    )
    .unwrap_err();
    assert!(matches!(err, TimesliceError::Config(_)));
}

#[test]
fn frames_to_video_rejects_empty_dirs_and_zero_fps() {
    let dir = Path::new("target").join("pipeline_empty_frames");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("notes.txt"), b"not a frame").unwrap();
    let out = dir.join("out.mp4");

    assert!(matches!(
        frames_to_video(&dir, &out, 24, true),
        Err(TimesliceError::Config(_))
    ));
    assert!(matches!(
        frames_to_video(&dir, &out, 0, true),
        Err(TimesliceError::Config(_))
    ));
    assert!(!out.exists());
}
