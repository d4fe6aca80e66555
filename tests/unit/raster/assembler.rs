use super::*;
use crate::foundation::core::Voxel;

fn q(step: u32, row: u32, col: u32) -> SampleQuery {
    SampleQuery {
        coord: Voxel::new(0, 0, 0),
        step,
        row,
        col,
    }
}

#[test]
fn cells_land_at_row_col() {
    let mut a = RasterAssembler::new([Resolution::new(3, 2).unwrap()]);
    assert_eq!(a.remaining(), 6);
    for row in 0..2 {
        for col in 0..3 {
            a.write(&q(0, row, col), Rgb8::new(row as u8, col as u8, 7))
                .unwrap();
        }
    }
    let rasters = a.finish().unwrap();
    assert_eq!(rasters.len(), 1);
    assert_eq!(rasters[0].dimensions(), (3, 2));
    assert_eq!(rasters[0].get_pixel(2, 1).0, [1, 2, 7]);
}

#[test]
fn double_write_is_rejected() {
    let mut a = RasterAssembler::new([Resolution::new(1, 1).unwrap()]);
    a.write(&q(0, 0, 0), Rgb8::BLACK).unwrap();
    assert!(a.write(&q(0, 0, 0), Rgb8::BLACK).is_err());
}

#[test]
fn incomplete_rasters_do_not_finish() {
    let mut a = RasterAssembler::new([
        Resolution::new(1, 1).unwrap(),
        Resolution::new(2, 1).unwrap(),
    ]);
    a.write(&q(0, 0, 0), Rgb8::BLACK).unwrap();
    a.write(&q(1, 0, 1), Rgb8::BLACK).unwrap();
    assert_eq!(a.remaining(), 1);
    assert!(a.finish().is_err());
}

#[test]
fn out_of_range_targets_are_rejected() {
    let mut a = RasterAssembler::new([Resolution::new(2, 2).unwrap()]);
    assert!(a.write(&q(1, 0, 0), Rgb8::BLACK).is_err());
    assert!(a.write(&q(0, 2, 0), Rgb8::BLACK).is_err());
    assert!(a.write(&q(0, 0, 2), Rgb8::BLACK).is_err());
    assert_eq!(a.remaining(), 4);
}
