use super::*;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 2,
        height: 2,
        fps: 15,
    }
}

#[test]
fn in_memory_sink_captures_config_and_frames() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(0, &RgbImage::new(2, 2)).unwrap();
    sink.push_frame(1, &RgbImage::new(2, 2)).unwrap();
    sink.end().unwrap();

    assert_eq!(sink.config(), Some(cfg()));
    assert_eq!(sink.frames().len(), 2);
    assert_eq!(sink.frames()[1].0, 1);
    assert!(sink.is_ended());
}

#[test]
fn png_sequence_sink_writes_numbered_files() {
    let dir = PathBuf::from("target").join("png_sequence_sink");
    let _ = std::fs::remove_dir_all(&dir);

    let mut sink = PngSequenceSink::new(&dir, "slice");
    assert_eq!(sink.dir(), dir.as_path());
    sink.begin(cfg()).unwrap();
    for step in 0..3 {
        sink.push_frame(step, &RgbImage::new(2, 2)).unwrap();
    }
    sink.end().unwrap();

    assert_eq!(sink.written().len(), 3);
    assert!(dir.join("slice_0.png").is_file());
    assert!(dir.join("slice_2.png").is_file());
}

#[test]
fn png_sequence_sink_enforces_step_order() {
    let dir = PathBuf::from("target").join("png_sequence_order");
    let mut sink = PngSequenceSink::new(&dir, "s");
    sink.begin(cfg()).unwrap();
    sink.push_frame(1, &RgbImage::new(1, 1)).unwrap();
    assert!(sink.push_frame(1, &RgbImage::new(1, 1)).is_err());
    assert!(sink.push_frame(0, &RgbImage::new(1, 1)).is_err());
}
