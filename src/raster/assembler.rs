use image::RgbImage;

use crate::foundation::core::{Resolution, Rgb8};
use crate::foundation::error::{TimesliceError, TimesliceResult};
use crate::plane::mapper::MappedPlane;
use crate::schedule::scheduler::SampleQuery;

/// Collects resolved samples into one RGB raster per step.
///
/// Rasters start black. Each cell accepts exactly one write; a second write to the same cell, or
/// finishing with cells left unwritten, is an error.
#[derive(Debug)]
pub struct RasterAssembler {
    rasters: Vec<RgbImage>,
    written: Vec<Vec<bool>>,
    remaining: usize,
}

impl RasterAssembler {
    /// One black raster per resolution, indexed by step.
    pub fn new(resolutions: impl IntoIterator<Item = Resolution>) -> Self {
        let mut rasters = Vec::new();
        let mut written = Vec::new();
        let mut remaining = 0usize;
        for res in resolutions {
            rasters.push(RgbImage::new(res.width, res.height));
            written.push(vec![false; res.cells()]);
            remaining += res.cells();
        }
        Self {
            rasters,
            written,
            remaining,
        }
    }

    /// Rasters matching the sample grids of `planes`.
    pub fn for_planes(planes: &[MappedPlane]) -> Self {
        Self::new(planes.iter().map(|p| p.resolution))
    }

    /// Number of rasters.
    pub fn steps(&self) -> usize {
        self.rasters.len()
    }

    /// Cells not yet written.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Store the color resolved for `query`.
    pub fn write(&mut self, query: &SampleQuery, color: Rgb8) -> TimesliceResult<()> {
        let raster = self
            .rasters
            .get_mut(query.step as usize)
            .ok_or_else(|| {
                TimesliceError::encode(format!("query targets unknown step {}", query.step))
            })?;
        if query.col >= raster.width() || query.row >= raster.height() {
            return Err(TimesliceError::encode(format!(
                "cell ({}, {}) is outside the {}x{} raster of step {}",
                query.row,
                query.col,
                raster.width(),
                raster.height(),
                query.step
            )));
        }

        let idx = query.row as usize * raster.width() as usize + query.col as usize;
        let seen = &mut self.written[query.step as usize][idx];
        if *seen {
            return Err(TimesliceError::encode(format!(
                "cell ({}, {}) of step {} was written twice",
                query.row, query.col, query.step
            )));
        }
        *seen = true;
        self.remaining -= 1;

        raster.put_pixel(query.col, query.row, color.into());
        Ok(())
    }

    /// Hand out the completed rasters in step order.
    pub fn finish(self) -> TimesliceResult<Vec<RgbImage>> {
        if self.remaining != 0 {
            return Err(TimesliceError::encode(format!(
                "{} raster cells were never written",
                self.remaining
            )));
        }
        Ok(self.rasters)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/assembler.rs"]
mod tests;
