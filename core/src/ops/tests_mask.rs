use crate::geometry::{points_equal, polygon_area, Point2};
use crate::model::{EntityId, Line};
use crate::ops::mask::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn same_points(a: &[Point2], b: &[Point2]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(p, q)| points_equal(*p, *q))
}

#[test]
fn test_straight_baseline_mask() {
    let baseline = vec![[0.0, 0.0], [100.0, 0.0]];
    let mask = synthesize_mask(&baseline, 20.0, 10.0, 30.0).unwrap();

    assert_eq!(mask.len(), 4);
    assert!(same_points(&mask, &[[0.0, -20.0], [100.0, -20.0], [100.0, 10.0], [0.0, 10.0]]));
    assert!(approx(polygon_area(&mask), 3000.0));

    let height = line_height(Some(&baseline), Some(&mask)).unwrap();
    assert!(approx(height, 30.0));
}

#[test]
fn test_height_is_area_over_length() {
    let baseline = vec![[0.0, 0.0], [40.0, 10.0], [90.0, 5.0], [150.0, 30.0]];
    let mask = synthesize_mask(&baseline, 15.0, 5.0, 20.0).unwrap();
    let height = line_height(Some(&baseline), Some(&mask)).unwrap();

    let length = crate::geometry::polyline::polyline_length(&baseline);
    assert!(height > 0.0);
    assert!(approx(height, polygon_area(&mask) / length));
}

#[test]
fn test_leftward_baseline_keeps_upper_side_up() {
    let baseline = vec![[100.0, 0.0], [0.0, 0.0]];
    let mask = synthesize_mask(&baseline, 20.0, 10.0, 30.0).unwrap();
    assert!(same_points(&mask, &[[100.0, -20.0], [0.0, -20.0], [0.0, 10.0], [100.0, 10.0]]));
}

#[test]
fn test_canonical_normal_points_up() {
    assert!(points_equal(canonical_normal([1.0, 0.0]), [0.0, -1.0]));
    assert!(points_equal(canonical_normal([-1.0, 0.0]), [0.0, -1.0]));
    // Vertical baselines get a rightward normal either way
    assert!(points_equal(canonical_normal([0.0, 1.0]), [1.0, 0.0]));
    assert!(points_equal(canonical_normal([0.0, -1.0]), [1.0, 0.0]));
}

#[test]
fn test_single_point_baseline_gets_box() {
    let mask = synthesize_mask(&[[10.0, 10.0]], 20.0, 10.0, 30.0).unwrap();
    assert!(same_points(&mask, &[[-5.0, -10.0], [25.0, -10.0], [25.0, 20.0], [-5.0, 20.0]]));
    assert!(synthesize_mask(&[], 20.0, 10.0, 30.0).is_none());
}

#[test]
fn test_insert_and_remove_pair() {
    let mut baseline = vec![[0.0, 0.0], [100.0, 0.0]];
    let mut mask = synthesize_mask(&baseline, 20.0, 10.0, 30.0).unwrap();

    baseline.insert(1, [50.0, 0.0]);
    assert!(insert_pair(&mut mask, &baseline, 1, 20.0, 10.0));
    let expected = synthesize_mask(&baseline, 20.0, 10.0, 30.0).unwrap();
    assert!(same_points(&mask, &expected));
    assert!(is_paired(&mask, &baseline));

    assert!(remove_pair(&mut mask, baseline.len(), 1));
    baseline.remove(1);
    assert!(same_points(&mask, &[[0.0, -20.0], [100.0, -20.0], [100.0, 10.0], [0.0, 10.0]]));
}

#[test]
fn test_pair_ops_reject_foreign_masks() {
    let baseline = vec![[0.0, 0.0], [50.0, 0.0], [100.0, 0.0]];
    let mut mask = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]];
    assert!(!insert_pair(&mut mask, &baseline, 1, 20.0, 10.0));
    assert!(!remove_pair(&mut mask, baseline.len(), 1));
    assert!(!refresh_pairs(&mut mask, &baseline, 1, 20.0, 10.0));
    assert_eq!(mask.len(), 3);
}

#[test]
fn test_refresh_follows_moved_vertex() {
    let mut baseline = vec![[0.0, 0.0], [50.0, 0.0], [100.0, 0.0]];
    let mut mask = synthesize_mask(&baseline, 20.0, 10.0, 30.0).unwrap();

    baseline[1] = [50.0, -15.0];
    assert!(refresh_pairs(&mut mask, &baseline, 1, 20.0, 10.0));
    let expected = synthesize_mask(&baseline, 20.0, 10.0, 30.0).unwrap();
    assert!(same_points(&mask, &expected));
}

#[test]
fn test_line_height_falls_back_to_mask_bounds() {
    let mask = vec![[0.0, 0.0], [40.0, 0.0], [40.0, 25.0], [0.0, 25.0]];
    assert!(approx(line_height(None, Some(&mask)).unwrap(), 25.0));
    assert!(line_height(Some(&[[0.0, 0.0], [10.0, 0.0]]), None).is_none());
}

#[test]
fn test_average_height_is_cached_until_invalidated() {
    let mut a = Line::new(EntityId(1), Some(vec![[0.0, 0.0], [100.0, 0.0]]), None);
    a.mask = synthesize_mask(a.baseline.as_deref().unwrap(), 20.0, 10.0, 30.0);
    let mut b = Line::new(EntityId(2), Some(vec![[0.0, 100.0], [100.0, 100.0]]), None);
    b.mask = synthesize_mask(b.baseline.as_deref().unwrap(), 40.0, 20.0, 60.0);

    let mut heights = LineHeights::default();
    assert!(approx(heights.average([&a, &b].into_iter()).unwrap(), 45.0));

    // Stale until invalidated
    assert!(approx(heights.average([&a].into_iter()).unwrap(), 45.0));
    heights.invalidate();
    assert!(approx(heights.average([&a].into_iter()).unwrap(), 30.0));

    let bare = Line::new(EntityId(3), Some(vec![[0.0, 0.0], [5.0, 0.0]]), None);
    assert!(approx(heights.height_of(&bare, [&a].into_iter()).unwrap(), 30.0));
}
