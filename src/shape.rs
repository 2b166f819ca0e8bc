//! Drawing geometry: turns [`ShapeData`] into a backend-neutral path.
//!
//! Polygons with a non-zero `bezier_factor` are smoothed into cubic segments.
//! Each vertex gets an incoming and outgoing control point along the line
//! joining its neighbours, offset in proportion to the adjacent edge lengths.

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;

use crate::doc::{ShapeData, ShapeKind};
use crate::viewport::Point;

/// Coincidence tolerance for deciding whether a polygon is closed.
const CLOSE_EPSILON: f64 = 1e-6;

/// One step of a vector path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    CubicTo { c1: Point, c2: Point, to: Point },
    Close,
}

/// Backend-neutral outline of a drawing, in drawing-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapePath {
    Rect { width: f64, height: f64 },
    Ellipse { center: Point, radius_x: f64, radius_y: f64 },
    Path(Vec<PathSegment>),
}

/// Build the outline for a drawing shape.
#[must_use]
pub fn build_path(shape: &ShapeData) -> ShapePath {
    match shape.kind {
        ShapeKind::Rectangle => ShapePath::Rect { width: shape.width, height: shape.height },
        ShapeKind::Ellipse => ShapePath::Ellipse {
            center: Point::new(shape.width / 2.0, shape.height / 2.0),
            radius_x: shape.width / 2.0,
            radius_y: shape.height / 2.0,
        },
        ShapeKind::Polygon => {
            let points = polygon_points(&shape.points);
            if shape.bezier_factor > 0.0 {
                ShapePath::Path(smooth_polygon(&points, shape.bezier_factor))
            } else {
                ShapePath::Path(straight_polygon(&points))
            }
        }
    }
}

/// Pair up a flat `[x0, y0, x1, y1, ...]` list. A trailing odd value is dropped.
#[must_use]
pub fn polygon_points(flat: &[f64]) -> Vec<Point> {
    flat.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect()
}

/// Whether the first and last points coincide.
#[must_use]
pub fn is_closed(points: &[Point]) -> bool {
    match (points.first(), points.last()) {
        (Some(a), Some(b)) if points.len() > 2 => {
            (a.x - b.x).abs() < CLOSE_EPSILON && (a.y - b.y).abs() < CLOSE_EPSILON
        }
        _ => false,
    }
}

fn straight_polygon(points: &[Point]) -> Vec<PathSegment> {
    let Some((first, rest)) = points.split_first() else {
        return Vec::new();
    };
    let mut segments = Vec::with_capacity(points.len() + 1);
    segments.push(PathSegment::MoveTo(*first));
    segments.extend(rest.iter().map(|p| PathSegment::LineTo(*p)));
    if is_closed(points) {
        segments.push(PathSegment::Close);
    }
    segments
}

/// Incoming and outgoing control points for `point`, given its neighbours.
#[must_use]
pub fn control_points(factor: f64, prev: Point, point: Point, next: Point) -> (Point, Point) {
    let vx = next.x - prev.x;
    let vy = next.y - prev.y;
    let pre = (point.x - prev.x).hypot(point.y - prev.y);
    let post = (next.x - point.x).hypot(next.y - point.y);
    let total = pre + post;
    let (d_in, d_out) = if total == 0.0 { (0.0, 0.0) } else { (factor * pre / total, factor * post / total) };
    (
        Point::new(point.x - vx * d_in, point.y - vy * d_in),
        Point::new(point.x + vx * d_out, point.y + vy * d_out),
    )
}

/// Smooth a polyline into cubic segments. Closed outlines wrap around.
#[must_use]
pub fn smooth_polygon(points: &[Point], factor: f64) -> Vec<PathSegment> {
    if points.len() < 3 {
        return straight_polygon(points);
    }
    let closed = is_closed(points);
    // For a closed outline the last point duplicates the first; neighbours
    // wrap over the distinct vertices only.
    let distinct = if closed { points.len() - 1 } else { points.len() };

    let neighbours = |i: usize| -> (Point, Point) {
        if closed {
            let prev = points[(i + distinct - 1) % distinct];
            let next = points[(i + 1) % distinct];
            (prev, next)
        } else {
            let prev = points[i.saturating_sub(1)];
            let next = points[(i + 1).min(distinct - 1)];
            (prev, next)
        }
    };

    let controls: Vec<(Point, Point)> = (0..distinct)
        .map(|i| {
            let (prev, next) = neighbours(i);
            control_points(factor, prev, points[i], next)
        })
        .collect();

    let mut segments = Vec::with_capacity(points.len() + 1);
    segments.push(PathSegment::MoveTo(points[0]));
    let edges = if closed { distinct } else { distinct - 1 };
    for i in 0..edges {
        let j = (i + 1) % distinct;
        segments.push(PathSegment::CubicTo { c1: controls[i].1, c2: controls[j].0, to: points[j] });
    }
    if closed {
        segments.push(PathSegment::Close);
    }
    segments
}
