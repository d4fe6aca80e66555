use super::*;
use crate::foundation::core::Resolution;
use crate::plane::mapper::{PlaneCorners, PlaneMapper, ResolutionPct};

fn plane(z_top: f64, z_bottom: f64, res: u32) -> MappedPlane {
    MappedPlane {
        corners: PlaneCorners::new(
            [0.0, 0.0, z_top].into(),
            [10.0, 0.0, z_top].into(),
            [0.0, 10.0, z_bottom].into(),
        ),
        resolution: Resolution::new(res, res).unwrap(),
    }
}

fn assert_sorted(s: &QuerySchedule) {
    assert!(s.queries().windows(2).all(|w| w[0].coord.z <= w[1].coord.z));
}

#[test]
fn one_query_per_cell_per_step() {
    let planes = [plane(0.0, 9.0, 3), plane(20.0, 5.0, 4)];
    let s = schedule_queries(&planes, &Threading::default()).unwrap();
    assert_eq!(s.len(), 9 + 16);
    assert_eq!(s.steps(), 2);

    let mut cells: Vec<(u32, u32, u32)> = s.queries().iter().map(|q| (q.step, q.row, q.col)).collect();
    cells.sort_unstable();
    cells.dedup();
    assert_eq!(cells.len(), 25);
}

#[test]
fn queries_are_globally_time_ordered_across_steps() {
    // The second step runs backwards in time relative to the first.
    let planes = [plane(0.0, 50.0, 5), plane(60.0, 10.0, 5), plane(30.0, 30.0, 5)];
    let s = schedule_queries(&planes, &Threading::default()).unwrap();
    assert_sorted(&s);
    assert_eq!(s.queries().first().unwrap().coord.z, 5);
}

#[test]
fn parallel_schedule_matches_serial_multiset() {
    let mapper = PlaneMapper::new(VolumeBounds::new(40, 30, 80).unwrap());
    let planes: Vec<_> = (0..6)
        .map(|i| {
            let z = f64::from(i) * 10.0;
            mapper
                .map_static(
                    &PlaneCorners::new(
                        [0.0, 0.0, z].into(),
                        [100.0, 0.0, 100.0 - z].into(),
                        [0.0, 100.0, z / 2.0].into(),
                    ),
                    ResolutionPct::full(),
                )
                .unwrap()
        })
        .collect();

    let serial = schedule_queries(&planes, &Threading::default()).unwrap();
    let parallel = schedule_queries(
        &planes,
        &Threading {
            parallel: true,
            threads: Some(2),
        },
    )
    .unwrap();
    assert_sorted(&parallel);

    let key = |q: &SampleQuery| (q.step, q.row, q.col, q.coord.x, q.coord.y, q.coord.z);
    let mut a: Vec<_> = serial.queries().iter().map(key).collect();
    let mut b: Vec<_> = parallel.queries().iter().map(key).collect();
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, b);
}

#[test]
fn zero_threads_is_rejected() {
    let err = schedule_queries(
        &[plane(0.0, 0.0, 2)],
        &Threading {
            parallel: true,
            threads: Some(0),
        },
    )
    .unwrap_err();
    assert!(matches!(err, TimesliceError::Config(_)));
}

#[test]
fn max_frame_ignores_out_of_volume_queries() {
    let bounds = VolumeBounds::new(10, 10, 20).unwrap();
    let planes = [plane(0.0, 100.0, 10)];
    let s = schedule_queries(&planes, &Threading::default()).unwrap();
    assert_eq!(s.max_frame_in(bounds), Some(15));

    let outside = [plane(-50.0, -40.0, 2)];
    let s = schedule_queries(&outside, &Threading::default()).unwrap();
    assert_eq!(s.max_frame_in(bounds), None);
}
