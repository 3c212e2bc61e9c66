#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

// =============================================================
// Point
// =============================================================

#[test]
fn point_delta_and_offset_are_inverse() {
    let a = Point::new(10.0, 20.0);
    let b = Point::new(4.0, -6.0);
    let d = a.delta_from(b);
    assert_eq!(d, Point::new(6.0, 26.0));
    assert_eq!(b.offset(d.x, d.y), a);
}

// =============================================================
// Rect
// =============================================================

#[test]
fn rect_edges() {
    let r = Rect::new(10.0, 20.0, 30.0, 40.0);
    assert_eq!(r.left(), 10.0);
    assert_eq!(r.top(), 20.0);
    assert_eq!(r.right(), 40.0);
    assert_eq!(r.bottom(), 60.0);
    assert_eq!(r.center(), Point::new(25.0, 40.0));
}

#[test]
fn intersection_area_partial_overlap() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(5.0, 5.0, 10.0, 10.0);
    assert!(approx_eq(a.intersection_area(&b), 25.0));
    assert!(approx_eq(b.intersection_area(&a), 25.0));
}

#[test]
fn intersection_area_disjoint_is_zero() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(20.0, 0.0, 10.0, 10.0);
    assert_eq!(a.intersection_area(&b), 0.0);
}

#[test]
fn intersection_area_touching_edges_is_zero() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(10.0, 0.0, 10.0, 10.0);
    assert_eq!(a.intersection_area(&b), 0.0);
    assert!(a.intersects(&b));
}

#[test]
fn negative_size_has_zero_area() {
    assert_eq!(Rect::new(0.0, 0.0, -5.0, 10.0).area(), 0.0);
}

#[test]
fn expanded_grows_every_side() {
    let r = Rect::new(0.0, 0.0, 10.0, 10.0).expanded(5.0);
    assert_eq!(r, Rect::new(-5.0, -5.0, 20.0, 20.0));
}

#[test]
fn sanitized_clamps_malformed_geometry() {
    let r = Rect::new(f64::NAN, f64::INFINITY, -3.0, f64::NAN).sanitized();
    assert_eq!(r, Rect::new(0.0, 0.0, MIN_SIZE, MIN_SIZE));
}

#[test]
fn contains_point_inclusive_edges() {
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(r.contains_point(Point::new(10.0, 10.0)));
    assert!(!r.contains_point(Point::new(10.1, 5.0)));
}

// =============================================================
// Rotation
// =============================================================

#[test]
fn normalize_degrees_wraps_into_range() {
    assert_eq!(normalize_degrees(0.0), 0.0);
    assert_eq!(normalize_degrees(360.0), 0.0);
    assert_eq!(normalize_degrees(370.0), 10.0);
    assert_eq!(normalize_degrees(-90.0), 270.0);
    assert_eq!(normalize_degrees(f64::NAN), 0.0);
}

#[test]
fn normalize_degrees_tiny_negative_stays_below_360() {
    let r = normalize_degrees(-1e-20);
    assert!((0.0..360.0).contains(&r));
}

// =============================================================
// Boundary
// =============================================================

#[test]
fn boundary_toward_exits_on_facing_edge() {
    let r = Rect::new(0.0, 0.0, 100.0, 50.0);
    assert_eq!(r.boundary_toward(Point::new(300.0, 25.0)), Point::new(100.0, 25.0));
    assert_eq!(r.boundary_toward(Point::new(50.0, -200.0)), Point::new(50.0, 0.0));
}

#[test]
fn boundary_toward_diagonal_hits_nearer_edge() {
    let r = Rect::new(0.0, 0.0, 100.0, 50.0);
    // Centre (50, 25); direction (100, 100) hits the bottom edge first.
    let p = r.boundary_toward(Point::new(150.0, 125.0));
    assert!(approx_eq(p.x, 75.0));
    assert!(approx_eq(p.y, 50.0));
}

#[test]
fn boundary_toward_inside_target_is_target() {
    let r = Rect::new(0.0, 0.0, 100.0, 50.0);
    assert_eq!(r.boundary_toward(Point::new(60.0, 30.0)), Point::new(60.0, 30.0));
    assert_eq!(r.boundary_toward(r.center()), r.center());
}
