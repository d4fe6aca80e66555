use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::TimesliceResult;

/// File name of animation step `step`: `<base>_<step>.png`.
pub fn frame_file_name(base: &str, step: u32) -> String {
    format!("{base}_{step}.png")
}

/// Integer value of the last run of ASCII digits in the file stem.
///
/// `slice_12.png -> 12`, `take2_007.png -> 7`, `cover.png -> None`.
pub fn frame_number(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    let end = stem.rfind(|c: char| c.is_ascii_digit())? + 1;
    let start = stem[..end]
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(0, |(i, c)| i + c.len_utf8());
    stem[start..end].parse().ok()
}

/// PNG files in `dir` ordered by [`frame_number`] as integers, so `_2` precedes `_10`.
///
/// Files without a numeric suffix are skipped.
pub fn list_numbered_frames(dir: &Path) -> TimesliceResult<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read frame dir '{}'", dir.display()))?
    {
        let path = entry
            .with_context(|| format!("read frame dir '{}'", dir.display()))?
            .path();
        let is_png = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if !is_png {
            continue;
        }
        match frame_number(&path) {
            Some(n) => frames.push((n, path)),
            None => tracing::debug!(path = %path.display(), "skipping unnumbered frame"),
        }
    }
    frames.sort();
    Ok(frames.into_iter().map(|(_, p)| p).collect())
}

#[cfg(test)]
#[path = "../../tests/unit/output/sequence.rs"]
mod tests;
