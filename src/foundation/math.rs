use crate::foundation::core::{Point3, Voxel};

/// Map a continuous coordinate onto its voxel index.
///
/// Nearest integer, ties to even: `0.5 -> 0`, `1.5 -> 2`, `-0.5 -> 0`. Callers guarantee a
/// finite input; out-of-range magnitudes saturate and land outside any volume.
pub(crate) fn round_to_voxel(v: f64) -> i64 {
    v.round_ties_even() as i64
}

pub(crate) fn round_point(p: Point3) -> Voxel {
    Voxel::new(
        round_to_voxel(p.x),
        round_to_voxel(p.y),
        round_to_voxel(p.z),
    )
}

/// `a * (1 - t) + b * t`; returns `b` exactly at `t == 1`.
pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

pub(crate) fn lerp_point(a: Point3, b: Point3, t: f64) -> Point3 {
    Point3::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t), lerp(a.z, b.z, t))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
