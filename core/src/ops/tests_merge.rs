use crate::geometry::{points_equal, polygon_area, Point2};
use crate::model::{EntityId, Line};
use crate::ops::mask::synthesize_mask;
use crate::ops::merge::*;

fn line(id: u64, baseline: Vec<Point2>) -> Line {
    let mask = synthesize_mask(&baseline, 20.0, 10.0, 30.0);
    Line::new(EntityId(id), Some(baseline), mask)
}

fn same_points(a: &[Point2], b: &[Point2]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(p, q)| points_equal(*p, *q))
}

#[test]
fn test_facing_baselines_join_end_to_start() {
    let a = line(1, vec![[0.0, 0.0], [50.0, 0.0]]);
    let b = line(2, vec![[60.0, 0.0], [100.0, 0.0]]);

    let (baseline, mask) = merge_geometry(&a, &b);
    let baseline = baseline.unwrap();
    assert!(same_points(&baseline, &[[0.0, 0.0], [50.0, 0.0], [60.0, 0.0], [100.0, 0.0]]));

    let mask = mask.unwrap();
    assert_eq!(mask.len(), 8);
    assert!((polygon_area(&mask) - 3000.0).abs() < 1e-6);
}

#[test]
fn test_join_flips_second_to_meet_nearest_ends() {
    let first = vec![[0.0, 0.0], [50.0, 0.0]];
    let second = vec![[100.0, 0.0], [55.0, 0.0]];
    let joined = join_baselines(&first, &second, 60.0);
    assert!(same_points(&joined, &[[0.0, 0.0], [50.0, 0.0], [55.0, 0.0], [100.0, 0.0]]));

    let before = vec![[-40.0, 0.0], [-5.0, 0.0]];
    let joined = join_baselines(&first, &before, 60.0);
    assert!(same_points(&joined, &[[-40.0, 0.0], [-5.0, 0.0], [0.0, 0.0], [50.0, 0.0]]));
}

#[test]
fn test_far_baselines_are_appended() {
    let first = vec![[0.0, 0.0], [50.0, 0.0]];
    let second = vec![[300.0, 0.0], [200.0, 0.0]];
    let joined = join_baselines(&first, &second, 10.0);
    assert!(same_points(&joined, &[[0.0, 0.0], [50.0, 0.0], [300.0, 0.0], [200.0, 0.0]]));
}

#[test]
fn test_touching_ends_collapse() {
    let first = vec![[0.0, 0.0], [50.0, 0.0]];
    let second = vec![[50.0, 0.0], [90.0, 0.0]];
    let joined = join_baselines(&first, &second, 45.0);
    assert!(same_points(&joined, &[[0.0, 0.0], [50.0, 0.0], [90.0, 0.0]]));
}

#[test]
fn test_merge_order_by_centre() {
    let a = line(1, vec![[200.0, 0.0], [250.0, 0.0]]);
    let b = line(2, vec![[0.0, 0.0], [50.0, 0.0]]);
    let c = line(3, vec![[100.0, 0.0], [150.0, 0.0]]);
    assert_eq!(merge_order(&[&a, &b, &c]), vec![EntityId(2), EntityId(3), EntityId(1)]);
}

#[test]
fn test_merge_order_right_to_left() {
    let a = line(1, vec![[250.0, 0.0], [200.0, 0.0]]);
    let b = line(2, vec![[50.0, 0.0], [0.0, 0.0]]);
    let c = line(3, vec![[100.0, 0.0], [150.0, 0.0]]);
    assert_eq!(merge_order(&[&a, &b, &c]), vec![EntityId(1), EntityId(3), EntityId(2)]);
}

#[test]
fn test_mask_only_partner_keeps_baseline() {
    let a = line(1, vec![[0.0, 0.0], [50.0, 0.0]]);
    let mut b = Line::new(EntityId(2), None, Some(vec![[60.0, -20.0], [90.0, -20.0], [90.0, 10.0], [60.0, 10.0]]));
    b.mask_derived = false;

    let (baseline, mask) = merge_geometry(&a, &b);
    assert_eq!(baseline, a.baseline);
    assert_eq!(mask.unwrap().len(), 8);
}
