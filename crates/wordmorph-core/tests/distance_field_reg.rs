//! Distance field regression test
//!
//! Verifies the signed-distance invariants on synthetic images: the sign
//! tracks ink membership, boundary ink sits at zero, and magnitudes grow
//! monotonically away from the nearest ink/background boundary.
//!
//! Run with:
//! ```
//! cargo test -p wordmorph-core --test distance_field_reg
//! ```

use wordmorph_core::{BACKGROUND, BitonalImage, DistanceField, INK};

fn field(img: &BitonalImage) -> DistanceField {
    DistanceField::compute(img, 10_000, -10_000).unwrap()
}

#[test]
fn distance_field_reg() {
    // ---------------------------------------------------------------
    // Single filled rectangle
    // ---------------------------------------------------------------
    let mut img = BitonalImage::new(25, 17).unwrap();
    img.fill_rect(5, 4, 13, 9, INK);
    let f = field(&img);

    // sign invariant: non-positive exactly on ink
    for y in 0..17 {
        for x in 0..25 {
            if img.is_ink(x, y) {
                assert!(f.get(x, y) <= 0, "ink ({x},{y}) = {}", f.get(x, y));
            } else {
                assert!(f.get(x, y) > 0, "bg ({x},{y}) = {}", f.get(x, y));
            }
        }
    }

    // every ink pixel with a 4-connected background neighbor is exactly 0
    for y in 0..17u32 {
        for x in 0..25u32 {
            if !img.is_ink(x, y) {
                continue;
            }
            let boundary = [(1i64, 0i64), (-1, 0), (0, 1), (0, -1)].iter().any(|&(dx, dy)| {
                let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                nx < 0
                    || ny < 0
                    || nx >= 25
                    || ny >= 17
                    || !img.is_ink(nx as u32, ny as u32)
            });
            // interior rectangle never touches the image edge here, so
            // boundary-ness reduces to having a background neighbor
            if boundary {
                assert_eq!(f.get(x, y), 0, "boundary ink ({x},{y})");
            } else {
                assert!(f.get(x, y) < 0, "interior ink ({x},{y})");
            }
        }
    }

    // magnitude grows monotonically walking straight into the rectangle
    let mut prev = 1;
    for x in 5..=11 {
        let v = f.get(x, 8);
        assert!(v <= prev, "row 8: d({x}) = {v} after {prev}");
        prev = v;
    }
    // and walking straight away from it
    let mut prev_out = 0;
    for x in 18..25 {
        let v = f.get(x, 8);
        assert!(v >= prev_out, "bg row 8: d({x}) = {v} after {prev_out}");
        assert_eq!(v, (x - 17) as i32);
        prev_out = v;
    }

    // ---------------------------------------------------------------
    // Single background pixel in an all-ink image
    // ---------------------------------------------------------------
    let mut hole = BitonalImage::new(9, 9).unwrap();
    hole.fill_rect(0, 0, 9, 9, INK);
    hole.set_pixel(4, 4, BACKGROUND).unwrap();
    let f = field(&hole);

    assert_eq!(f.get(4, 4), 1);
    // depth equals 1 - Manhattan distance to the hole, everywhere
    for y in 0..9i32 {
        for x in 0..9i32 {
            if (x, y) == (4, 4) {
                continue;
            }
            let manhattan = (x - 4).abs() + (y - 4).abs();
            assert_eq!(
                f.get(x as u32, y as u32),
                1 - manhattan,
                "hole image at ({x},{y})"
            );
        }
    }

    // ---------------------------------------------------------------
    // Clamping
    // ---------------------------------------------------------------
    let clamped = DistanceField::compute(&hole, 10_000, -3).unwrap();
    for v in clamped.values() {
        assert!(*v >= -3);
    }
    assert_eq!(clamped.get(0, 0), -3);
}
