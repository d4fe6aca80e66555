use crate::foundation::core::{Point3, Resolution, VolumeBounds, Voxel};
use crate::foundation::error::{TimesliceError, TimesliceResult};
use crate::foundation::math::{lerp_point, round_point};

/// Top-left, top-right and bottom-left corners of a sampling plane.
///
/// The fourth corner is implied (`p2 + p3 - p1`). Depending on context the points are either in
/// the normalized 0-100 input space or in native voxel space; [`PlaneMapper`] converts between
/// the two. Serializes as `[[x, y, z], [x, y, z], [x, y, z]]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[Point3; 3]", into = "[Point3; 3]")]
pub struct PlaneCorners {
    /// Top-left corner.
    pub p1: Point3,
    /// Top-right corner.
    pub p2: Point3,
    /// Bottom-left corner.
    pub p3: Point3,
}

impl PlaneCorners {
    /// Build corners from the three defining points.
    pub const fn new(p1: Point3, p2: Point3, p3: Point3) -> Self {
        Self { p1, p2, p3 }
    }

    /// The derived bottom-right corner.
    pub fn p4(&self) -> Point3 {
        self.p2 + self.p3 - self.p1
    }

    /// Reject NaN/infinite components.
    pub fn validate(&self) -> TimesliceResult<()> {
        for (name, p) in [("p1", self.p1), ("p2", self.p2), ("p3", self.p3)] {
            if !p.is_finite() {
                return Err(TimesliceError::config(format!(
                    "plane corner {name} must be finite, got {p:?}"
                )));
            }
        }
        Ok(())
    }

    fn scale(&self, (sx, sy, sz): (f64, f64, f64)) -> Self {
        Self::new(
            self.p1.scale(sx, sy, sz),
            self.p2.scale(sx, sy, sz),
            self.p3.scale(sx, sy, sz),
        )
    }

    fn lerp(&self, end: &Self, t: f64) -> Self {
        Self::new(
            lerp_point(self.p1, end.p1, t),
            lerp_point(self.p2, end.p2, t),
            lerp_point(self.p3, end.p3, t),
        )
    }
}

impl From<[Point3; 3]> for PlaneCorners {
    fn from(v: [Point3; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<PlaneCorners> for [Point3; 3] {
    fn from(c: PlaneCorners) -> Self {
        [c.p1, c.p2, c.p3]
    }
}

impl std::fmt::Display for PlaneCorners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt_p = |p: Point3| format!("[{}, {}, {}]", p.x, p.y, p.z);
        write!(
            f,
            "[{}, {}, {}]",
            fmt_p(self.p1),
            fmt_p(self.p2),
            fmt_p(self.p3)
        )
    }
}

/// Output resolution as a percentage of the source frame size. Serializes as `[w, h]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct ResolutionPct {
    /// Percentage of the frame width.
    pub width: f64,
    /// Percentage of the frame height.
    pub height: f64,
}

impl ResolutionPct {
    /// Build a percentage resolution.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Full native resolution.
    pub const fn full() -> Self {
        Self::new(100.0, 100.0)
    }

    /// Checks that can run before the source is probed.
    pub fn validate(&self) -> TimesliceResult<()> {
        if !(self.width.is_finite() && self.height.is_finite()) {
            return Err(TimesliceError::config("resolution must be finite"));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(TimesliceError::config(format!(
                "resolution must be greater than zero, got [{}, {}]",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl From<[f64; 2]> for ResolutionPct {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<ResolutionPct> for [f64; 2] {
    fn from(r: ResolutionPct) -> Self {
        [r.width, r.height]
    }
}

/// A plane moving linearly from `start` to `end` over `steps` discrete steps.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlaneAnimation {
    /// Corners at step 0.
    pub start: PlaneCorners,
    /// Corners at the last step.
    pub end: PlaneCorners,
    /// Number of steps, at least 2.
    pub steps: u32,
}

impl PlaneAnimation {
    /// Build a validated animation.
    pub fn new(start: PlaneCorners, end: PlaneCorners, steps: u32) -> TimesliceResult<Self> {
        let anim = Self { start, end, steps };
        anim.validate()?;
        Ok(anim)
    }

    /// Reject fewer than two steps or non-finite corners.
    pub fn validate(&self) -> TimesliceResult<()> {
        if self.steps < 2 {
            return Err(TimesliceError::config(format!(
                "animation needs at least 2 steps, got {}",
                self.steps
            )));
        }
        self.start.validate()?;
        self.end.validate()
    }

    /// Interpolation parameter for `step`: 0 at the first step, 1 at the last.
    pub fn t_at(&self, step: u32) -> f64 {
        f64::from(step) / f64::from(self.steps - 1)
    }

    /// Corners for `step`, interpolated in whatever space `start`/`end` are in.
    pub fn corners_at(&self, step: u32) -> PlaneCorners {
        self.start.lerp(&self.end, self.t_at(step))
    }
}

/// A plane in native voxel space together with its sample grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MappedPlane {
    /// Native-space corners.
    pub corners: PlaneCorners,
    /// Native sample counts.
    pub resolution: Resolution,
}

impl MappedPlane {
    /// Step between adjacent columns.
    pub fn width_vector(&self) -> Point3 {
        (self.corners.p2 - self.corners.p1) / f64::from(self.resolution.width)
    }

    /// Step between adjacent rows.
    pub fn height_vector(&self) -> Point3 {
        (self.corners.p3 - self.corners.p1) / f64::from(self.resolution.height)
    }

    /// Continuous sample position at the center of output cell `(row, col)`.
    pub fn sample_point(&self, row: u32, col: u32) -> Point3 {
        self.corners.p1
            + self.width_vector() * (f64::from(col) + 0.5)
            + self.height_vector() * (f64::from(row) + 0.5)
    }

    /// Voxel sampled for output cell `(row, col)`.
    pub fn voxel_at(&self, row: u32, col: u32) -> Voxel {
        round_point(self.sample_point(row, col))
    }

    /// Every output cell in row-major order as `(row, col, voxel)`.
    pub fn voxels(&self) -> impl Iterator<Item = (u32, u32, Voxel)> + '_ {
        let wv = self.width_vector();
        let hv = self.height_vector();
        let p1 = self.corners.p1;
        (0..self.resolution.height).flat_map(move |row| {
            (0..self.resolution.width).map(move |col| {
                let p = p1 + wv * (f64::from(col) + 0.5) + hv * (f64::from(row) + 0.5);
                (row, col, round_point(p))
            })
        })
    }
}

/// Converts normalized plane descriptions into native sample grids for one volume.
#[derive(Clone, Copy, Debug)]
pub struct PlaneMapper {
    bounds: VolumeBounds,
}

impl PlaneMapper {
    /// Mapper for `bounds`.
    pub fn new(bounds: VolumeBounds) -> Self {
        Self { bounds }
    }

    /// Volume this mapper targets.
    pub fn bounds(&self) -> VolumeBounds {
        self.bounds
    }

    /// Scale normalized corners by `width/100`, `height/100`, `frame_count/100` per axis.
    pub fn native_corners(&self, corners: &PlaneCorners) -> TimesliceResult<PlaneCorners> {
        corners.validate()?;
        Ok(corners.scale(self.bounds.normalized_scale()))
    }

    /// Convert a percentage resolution to native sample counts (truncated toward zero).
    pub fn native_resolution(&self, pct: ResolutionPct) -> TimesliceResult<Resolution> {
        pct.validate()?;
        let width = native_extent(pct.width, self.bounds.width)?;
        let height = native_extent(pct.height, self.bounds.height)?;
        Resolution::new(width, height).map_err(|_| {
            TimesliceError::config(format!(
                "resolution [{}, {}] of a {}x{} video maps to {width}x{height} samples; both must be greater than zero",
                pct.width, pct.height, self.bounds.width, self.bounds.height
            ))
        })
    }

    /// Map a single static plane.
    pub fn map_static(
        &self,
        corners: &PlaneCorners,
        pct: ResolutionPct,
    ) -> TimesliceResult<MappedPlane> {
        let resolution = self.native_resolution(pct)?;
        Ok(MappedPlane {
            corners: self.native_corners(corners)?,
            resolution,
        })
    }

    /// Map every step of an animation; element `i` is step `i`.
    pub fn map_animation(
        &self,
        anim: &PlaneAnimation,
        pct: ResolutionPct,
    ) -> TimesliceResult<Vec<MappedPlane>> {
        anim.validate()?;
        let resolution = self.native_resolution(pct)?;
        let native = PlaneAnimation {
            start: self.native_corners(&anim.start)?,
            end: self.native_corners(&anim.end)?,
            steps: anim.steps,
        };
        Ok((0..native.steps)
            .map(|step| MappedPlane {
                corners: native.corners_at(step),
                resolution,
            })
            .collect())
    }
}

fn native_extent(pct: f64, dim: u32) -> TimesliceResult<u32> {
    let v = (pct * f64::from(dim) / 100.0).trunc();
    if v > f64::from(u32::MAX) {
        return Err(TimesliceError::config(format!(
            "resolution {pct}% of {dim} is too large"
        )));
    }
    Ok(v.max(0.0) as u32)
}

#[cfg(test)]
#[path = "../../tests/unit/plane/mapper.rs"]
mod tests;
