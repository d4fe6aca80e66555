use super::*;

fn bounds(w: u32, h: u32, f: u64) -> VolumeBounds {
    VolumeBounds::new(w, h, f).unwrap()
}

fn corners(p1: [f64; 3], p2: [f64; 3], p3: [f64; 3]) -> PlaneCorners {
    PlaneCorners::new(p1.into(), p2.into(), p3.into())
}

#[test]
fn identity_volume_samples_cell_centers() {
    let mapper = PlaneMapper::new(bounds(100, 100, 100));
    let plane = mapper
        .map_static(
            &corners([0.0, 0.0, 0.0], [100.0, 0.0, 0.0], [0.0, 100.0, 0.0]),
            ResolutionPct::new(10.0, 10.0),
        )
        .unwrap();

    assert_eq!(plane.resolution, Resolution::new(10, 10).unwrap());
    assert_eq!(plane.voxel_at(0, 0), Voxel::new(5, 5, 0));
    assert_eq!(plane.voxel_at(0, 9), Voxel::new(95, 5, 0));
    assert_eq!(plane.voxel_at(9, 0), Voxel::new(5, 95, 0));
    assert_eq!(plane.voxel_at(3, 7), Voxel::new(75, 35, 0));
}

#[test]
fn normalized_space_scales_per_axis() {
    let mapper = PlaneMapper::new(bounds(640, 360, 200));
    assert_eq!(mapper.bounds(), bounds(640, 360, 200));
    let native = mapper
        .native_corners(&corners(
            [50.0, 50.0, 50.0],
            [100.0, 0.0, 25.0],
            [-10.0, 200.0, 100.0],
        ))
        .unwrap();
    assert_eq!(native.p1, Point3::new(320.0, 180.0, 100.0));
    assert_eq!(native.p2, Point3::new(640.0, 0.0, 50.0));
    assert_eq!(native.p3, Point3::new(-64.0, 720.0, 200.0));
}

#[test]
fn resolution_scales_with_frame_size_and_truncates() {
    let mapper = PlaneMapper::new(bounds(641, 361, 10));
    let res = mapper
        .native_resolution(ResolutionPct::new(50.0, 50.0))
        .unwrap();
    assert_eq!(res, Resolution::new(320, 180).unwrap());
}

#[test]
fn resolution_that_truncates_to_zero_is_a_config_error() {
    let mapper = PlaneMapper::new(bounds(10, 10, 10));
    let err = mapper
        .native_resolution(ResolutionPct::new(5.0, 100.0))
        .unwrap_err();
    assert!(matches!(err, TimesliceError::Config(_)));

    assert!(ResolutionPct::new(0.0, 10.0).validate().is_err());
    assert!(ResolutionPct::new(10.0, -1.0).validate().is_err());
    assert!(ResolutionPct::new(f64::NAN, 1.0).validate().is_err());
}

#[test]
fn non_finite_corners_are_rejected() {
    let mapper = PlaneMapper::new(bounds(10, 10, 10));
    let bad = corners([0.0, f64::INFINITY, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
    assert!(matches!(
        mapper.native_corners(&bad),
        Err(TimesliceError::Config(_))
    ));
}

#[test]
fn animation_requires_two_steps() {
    let c = corners([0.0, 0.0, 0.0], [100.0, 0.0, 0.0], [0.0, 100.0, 0.0]);
    assert!(PlaneAnimation::new(c, c, 1).is_err());
    assert!(PlaneAnimation::new(c, c, 0).is_err());
    assert!(PlaneAnimation::new(c, c, 2).is_ok());
}

#[test]
fn animation_endpoints_reproduce_static_planes() {
    let mapper = PlaneMapper::new(bounds(64, 48, 90));
    let start = corners([51.78, -1.2, -7.17], [104.9, 21.7, 74.38], [54.6, 67.39, 9.83]);
    let end = corners([0.0, 62.1, 8.4], [100.0, 62.1, 8.4], [0.0, 96.8, 99.4]);
    let pct = ResolutionPct::new(50.0, 50.0);

    let anim = PlaneAnimation::new(start, end, 5).unwrap();
    let steps = mapper.map_animation(&anim, pct).unwrap();
    assert_eq!(steps.len(), 5);

    let first = mapper.map_static(&start, pct).unwrap();
    let last = mapper.map_static(&end, pct).unwrap();
    assert_eq!(steps[0], first);
    assert_eq!(steps[4], last);
}

#[test]
fn animation_midpoint_is_linear() {
    let a = corners([0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [0.0, 10.0, 0.0]);
    let b = corners([0.0, 0.0, 40.0], [10.0, 0.0, 40.0], [0.0, 10.0, 40.0]);
    let anim = PlaneAnimation::new(a, b, 3).unwrap();
    assert_eq!(anim.t_at(1), 0.5);
    assert_eq!(anim.corners_at(1).p1, Point3::new(0.0, 0.0, 20.0));
}

#[test]
fn voxels_iterates_row_major_and_matches_voxel_at() {
    let mapper = PlaneMapper::new(bounds(100, 100, 100));
    let plane = mapper
        .map_static(
            &corners([0.0, 0.0, 0.0], [100.0, 0.0, 100.0], [0.0, 100.0, 0.0]),
            ResolutionPct::new(4.0, 3.0),
        )
        .unwrap();
    let all: Vec<_> = plane.voxels().collect();
    assert_eq!(all.len(), 12);
    assert_eq!((all[0].0, all[0].1), (0, 0));
    assert_eq!((all[5].0, all[5].1), (1, 1));
    for (row, col, v) in all {
        assert_eq!(v, plane.voxel_at(row, col));
    }
}

#[test]
fn fourth_corner_is_derived() {
    let c = corners([0.0, 0.0, 0.0], [10.0, 0.0, 5.0], [0.0, 10.0, 1.0]);
    assert_eq!(c.p4(), Point3::new(10.0, 10.0, 6.0));
}

#[test]
fn corners_serialize_as_nested_arrays() {
    let c = corners([1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]);
    let json = serde_json::to_string(&c).unwrap();
    assert_eq!(json, "[[1.0,2.0,3.0],[4.0,5.0,6.0],[7.0,8.0,9.0]]");
    let back: PlaneCorners = serde_json::from_str(&json).unwrap();
    assert_eq!(back, c);
}
