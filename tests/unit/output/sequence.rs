use super::*;

#[test]
fn frame_names_embed_the_step() {
    assert_eq!(frame_file_name("timecube animation", 0), "timecube animation_0.png");
    assert_eq!(frame_file_name("a", 29), "a_29.png");
}

#[test]
fn frame_number_takes_last_digit_run() {
    assert_eq!(frame_number(Path::new("slice_12.png")), Some(12));
    assert_eq!(frame_number(Path::new("dir/take2_007.png")), Some(7));
    assert_eq!(frame_number(Path::new("42.png")), Some(42));
    assert_eq!(frame_number(Path::new("cover.png")), None);
}

#[test]
fn frame_number_handles_multibyte_prefixes() {
    assert_eq!(frame_number(Path::new("café12.png")), Some(12));
    assert_eq!(frame_number(Path::new("étape_3.png")), Some(3));
    assert_eq!(frame_number(Path::new("ü.png")), None);
}

#[test]
fn listing_orders_numerically_not_lexicographically() {
    let dir = std::path::PathBuf::from("target").join("sequence_listing");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    for name in ["f_10.png", "f_2.png", "f_1.png", "f_0.png", "notes.txt", "cover.png"] {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    let names: Vec<String> = list_numbered_frames(&dir)
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["f_0.png", "f_1.png", "f_2.png", "f_10.png"]);
}
