use crate::foundation::error::{TimesliceError, TimesliceResult};

/// A point in continuous 3D space, axes `(x = column, y = row, z = frame)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Point3 {
    /// Horizontal axis.
    pub x: f64,
    /// Vertical axis.
    pub y: f64,
    /// Time axis.
    pub z: f64,
}

impl Point3 {
    /// Build a point from its three components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// `true` if no component is NaN or infinite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Componentwise scale.
    pub fn scale(self, sx: f64, sy: f64, sz: f64) -> Self {
        Self::new(self.x * sx, self.y * sy, self.z * sz)
    }
}

impl std::ops::Add for Point3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Point3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f64> for Point3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Div<f64> for Point3 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Point3> for [f64; 3] {
    fn from(p: Point3) -> Self {
        [p.x, p.y, p.z]
    }
}

/// Integer voxel coordinate `(column, row, frame index)`. May lie outside the volume.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Voxel {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
    /// Frame index.
    pub z: i64,
}

impl Voxel {
    /// Build a voxel from its three components.
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

/// Coordinate domain of a video volume: `[0,width) x [0,height) x [0,frame_count)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VolumeBounds {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Number of frames the source reports.
    pub frame_count: u64,
}

impl VolumeBounds {
    /// Build bounds, rejecting empty frames. A zero `frame_count` is allowed; every voxel is then
    /// outside the volume.
    pub fn new(width: u32, height: u32, frame_count: u64) -> TimesliceResult<Self> {
        if width == 0 || height == 0 {
            return Err(TimesliceError::source_open(format!(
                "video frame size must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            frame_count,
        })
    }

    /// Exclusive upper bounds on every axis.
    pub fn contains(self, v: Voxel) -> bool {
        v.x >= 0
            && v.y >= 0
            && v.z >= 0
            && v.x < i64::from(self.width)
            && v.y < i64::from(self.height)
            && (v.z as u64) < self.frame_count
    }

    /// Per-axis factors mapping the normalized 0-100 space onto native voxel space.
    pub fn normalized_scale(self) -> (f64, f64, f64) {
        (
            f64::from(self.width) / 100.0,
            f64::from(self.height) / 100.0,
            self.frame_count as f64 / 100.0,
        )
    }
}

/// Number of samples along the two plane axes, in native pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Samples along `p1 -> p2`.
    pub width: u32,
    /// Samples along `p1 -> p3`.
    pub height: u32,
}

impl Resolution {
    /// Build a resolution; both axes must be positive.
    pub fn new(width: u32, height: u32) -> TimesliceResult<Self> {
        if width == 0 || height == 0 {
            return Err(TimesliceError::config(format!(
                "resolution must be greater than zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Number of output cells.
    pub fn cells(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Channel layout of packed 3-byte pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelOrder {
    /// Red, green, blue. The canonical internal order.
    #[default]
    Rgb,
    /// Blue, green, red.
    Bgr,
}

/// Straight 8-bit RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb8 {
    /// Color written for samples outside the volume.
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb8> for image::Rgb<u8> {
    fn from(c: Rgb8) -> Self {
        image::Rgb([c.r, c.g, c.b])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
