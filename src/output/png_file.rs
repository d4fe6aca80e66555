use std::fs::File;
use std::path::Path;

use anyhow::Context as _;
use image::RgbImage;

use crate::foundation::error::{TimesliceError, TimesliceResult};
use crate::output::atomic::{TempFileGuard, ensure_parent_dir, temp_sibling};

/// `tEXt` keyword used for the provenance tag.
pub const DESCRIPTION_KEY: &str = "Description";

/// Write `img` as an 8-bit RGB PNG, optionally tagged with a `Description` text chunk.
///
/// The file is written next to `path` under a temporary name and renamed into place only after
/// the encoder finished, so a failed write never leaves a truncated image at `path`.
pub fn write_png(path: &Path, img: &RgbImage, description: Option<&str>) -> TimesliceResult<()> {
    ensure_parent_dir(path)?;
    let tmp = temp_sibling(path);
    let guard = TempFileGuard::new(tmp.clone());

    let file =
        File::create(&tmp).with_context(|| format!("create png '{}'", tmp.display()))?;
    let mut encoder = png::Encoder::new(&file, img.width(), img.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    if let Some(text) = description {
        encoder
            .add_text_chunk(DESCRIPTION_KEY.to_string(), text.to_string())
            .map_err(|e| TimesliceError::encode(format!("png text chunk: {e}")))?;
    }
    let mut writer = encoder
        .write_header()
        .map_err(|e| TimesliceError::encode(format!("png header: {e}")))?;
    writer
        .write_image_data(img.as_raw())
        .map_err(|e| TimesliceError::encode(format!("png image data: {e}")))?;
    writer
        .finish()
        .map_err(|e| TimesliceError::encode(format!("png finish: {e}")))?;
    file.sync_all()
        .with_context(|| format!("flush png '{}'", tmp.display()))?;
    drop(file);

    guard.publish(path)
}

/// Read the `Description` text chunk of a PNG, if present.
pub fn read_png_description(path: &Path) -> TimesliceResult<Option<String>> {
    let file = File::open(path).with_context(|| format!("open png '{}'", path.display()))?;
    let reader = png::Decoder::new(file)
        .read_info()
        .map_err(|e| TimesliceError::decode(format!("png '{}': {e}", path.display())))?;
    Ok(reader
        .info()
        .uncompressed_latin1_text
        .iter()
        .find(|c| c.keyword == DESCRIPTION_KEY)
        .map(|c| c.text.clone()))
}

#[cfg(test)]
#[path = "../../tests/unit/output/png_file.rs"]
mod tests;
