#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn shape(kind: ShapeKind, points: Vec<f64>, bezier_factor: f64) -> ShapeData {
    ShapeData { kind, width: 200.0, height: 100.0, points, bezier_factor }
}

#[test]
fn rectangle_uses_shape_size() {
    let path = build_path(&shape(ShapeKind::Rectangle, vec![], 0.0));
    assert_eq!(path, ShapePath::Rect { width: 200.0, height: 100.0 });
}

#[test]
fn ellipse_is_inscribed() {
    let ShapePath::Ellipse { center, radius_x, radius_y } = build_path(&shape(ShapeKind::Ellipse, vec![], 0.0)) else {
        panic!("expected ellipse");
    };
    assert!(point_approx_eq(center, Point::new(100.0, 50.0)));
    assert_eq!(radius_x, 100.0);
    assert_eq!(radius_y, 50.0);
}

#[test]
fn polygon_points_drop_trailing_value() {
    let pts = polygon_points(&[0.0, 0.0, 10.0, 5.0, 99.0]);
    assert_eq!(pts, vec![Point::new(0.0, 0.0), Point::new(10.0, 5.0)]);
}

#[test]
fn unsmoothed_open_polygon_is_line_segments() {
    let path = build_path(&shape(ShapeKind::Polygon, vec![0.0, 0.0, 10.0, 0.0, 10.0, 10.0], 0.0));
    let ShapePath::Path(segments) = path else {
        panic!("expected path");
    };
    assert_eq!(
        segments,
        vec![
            PathSegment::MoveTo(Point::new(0.0, 0.0)),
            PathSegment::LineTo(Point::new(10.0, 0.0)),
            PathSegment::LineTo(Point::new(10.0, 10.0)),
        ]
    );
}

#[test]
fn unsmoothed_closed_polygon_ends_with_close() {
    let path = build_path(&shape(ShapeKind::Polygon, vec![0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 0.0], 0.0));
    let ShapePath::Path(segments) = path else {
        panic!("expected path");
    };
    assert_eq!(segments.last(), Some(&PathSegment::Close));
}

#[test]
fn empty_polygon_has_no_segments() {
    let path = build_path(&shape(ShapeKind::Polygon, vec![], 0.5));
    assert_eq!(path, ShapePath::Path(vec![]));
}

#[test]
fn is_closed_requires_three_points() {
    assert!(!is_closed(&[Point::new(0.0, 0.0), Point::new(0.0, 0.0)]));
    assert!(is_closed(&[Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 0.0)]));
}

#[test]
fn control_points_are_collinear_with_neighbours() {
    let (c_in, c_out) = control_points(0.5, Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(20.0, 0.0));
    // Equal edge lengths: each control point sits factor/2 of the neighbour span away.
    assert!(point_approx_eq(c_in, Point::new(5.0, 0.0)));
    assert!(point_approx_eq(c_out, Point::new(15.0, 0.0)));
}

#[test]
fn control_points_degenerate_to_point() {
    let p = Point::new(3.0, 3.0);
    let (c_in, c_out) = control_points(0.5, p, p, p);
    assert!(point_approx_eq(c_in, p));
    assert!(point_approx_eq(c_out, p));
}

#[test]
fn smoothed_open_polyline_has_one_cubic_per_edge() {
    let pts = [Point::new(0.0, 0.0), Point::new(10.0, 10.0), Point::new(20.0, 0.0)];
    let segments = smooth_polygon(&pts, 0.5);
    assert_eq!(segments.len(), 3);
    assert!(matches!(segments[0], PathSegment::MoveTo(_)));
    let PathSegment::CubicTo { to, .. } = segments[2] else {
        panic!("expected cubic");
    };
    assert!(point_approx_eq(to, Point::new(20.0, 0.0)));
}

#[test]
fn smoothed_closed_polygon_wraps_and_closes() {
    let pts = [
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(10.0, 10.0),
        Point::new(0.0, 10.0),
        Point::new(0.0, 0.0),
    ];
    let segments = smooth_polygon(&pts, 0.25);
    // MoveTo + four edges + Close
    assert_eq!(segments.len(), 6);
    assert_eq!(segments[5], PathSegment::Close);
    let PathSegment::CubicTo { to, .. } = segments[4] else {
        panic!("expected cubic");
    };
    assert!(point_approx_eq(to, Point::new(0.0, 0.0)));
}

#[test]
fn smoothed_square_is_symmetric_at_start() {
    let pts = [
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(10.0, 10.0),
        Point::new(0.0, 10.0),
        Point::new(0.0, 0.0),
    ];
    let segments = smooth_polygon(&pts, 0.5);
    let PathSegment::CubicTo { c1, .. } = segments[1] else {
        panic!("expected cubic");
    };
    // Vertex 0 neighbours are (0,10) and (10,0): tangent (10,-10), equal edges.
    assert!(point_approx_eq(c1, Point::new(2.5, -2.5)));
}
