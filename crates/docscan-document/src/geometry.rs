// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Planar geometry shared by detection and rectification: corner ordering,
// distances, convexity, closed-polygon simplification and line fitting.

use docscan_core::error::{DocscanError, Result};
use docscan_core::{Point2D, Quadrilateral};
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;

/// Order four points as `[top_left, top_right, bottom_right, bottom_left]`.
///
/// Uses the sum/difference heuristic: top-left has the smallest `x + y`,
/// bottom-right the largest; top-right has the smallest `y - x`, bottom-left
/// the largest. Ties are broken on coordinates, never on input position, so
/// the result depends only on the point set.
///
/// The heuristic is only trustworthy for roughly upright quadrilaterals. When
/// it picks the same point for two corners (a document turned close to 45°),
/// the points are instead walked clockwise around their centroid starting
/// from the top-left-most one, so the output is always a permutation of the
/// input.
///
/// Fails with `InvalidInput` unless exactly four points are given.
pub fn order_corners(points: &[Point2D]) -> Result<Quadrilateral> {
    let pts: &[Point2D; 4] = points.try_into().map_err(|_| {
        DocscanError::invalid(format!("expected 4 corner points, got {}", points.len()))
    })?;

    let sum = |p: &Point2D| p.x + p.y;
    let diff = |p: &Point2D| p.y - p.x;

    let top_left = argmin_by(pts, |p| (sum(p), p.y, p.x));
    let bottom_right = argmin_by(pts, |p| (-sum(p), -p.y, -p.x));
    let top_right = argmin_by(pts, |p| (diff(p), p.y, -p.x));
    let bottom_left = argmin_by(pts, |p| (-diff(p), -p.y, p.x));

    let picks = [top_left, top_right, bottom_right, bottom_left];
    let distinct = (0..4).all(|i| (i + 1..4).all(|j| picks[i] != picks[j]));

    let ordered = if distinct {
        picks.map(|i| pts[i])
    } else {
        order_by_angle(pts)
    };

    Quadrilateral::new(ordered)
}

/// Straight-line distance between two points.
pub fn euclidean_distance(a: &Point2D, b: &Point2D) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Twice the signed area of the triangle `a, b, c` (z of the cross product).
fn cross(a: &Point2D, b: &Point2D, c: &Point2D) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Area of a polygon given in boundary order (shoelace formula).
pub fn polygon_area(points: &[Point2D]) -> f64 {
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area.abs() / 2.0
}

/// True when the quadrilateral, taken in its stored order, is strictly convex.
pub fn is_convex(quad: &Quadrilateral) -> bool {
    let p = quad.points();
    let turns: Vec<f64> = (0..4)
        .map(|i| cross(&p[i], &p[(i + 1) % 4], &p[(i + 2) % 4]))
        .collect();
    turns.iter().all(|t| *t > 0.0) || turns.iter().all(|t| *t < 0.0)
}

/// Simplify a closed curve with the Douglas-Peucker algorithm.
///
/// The curve is split at two mutually distant anchor points and each half is
/// simplified as an open chain, so the result does not depend on where
/// tracing happened to start. Every vertex of the output lies on the input
/// curve, and no input point is further than `epsilon` from the simplified
/// outline.
pub fn approximate_closed_polygon(points: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    let n = points.len();
    if n <= 3 || epsilon.is_nan() || epsilon <= 0.0 {
        return points.to_vec();
    }

    let first = farthest_from(points, &points[0]);
    let second = farthest_from(points, &points[first]);
    if first == second {
        return vec![points[first]];
    }
    let (lo, hi) = (first.min(second), first.max(second));

    let curve: Vec<Point<f64>> = points.iter().map(|p| Point::new(p.x, p.y)).collect();
    let wrapped: Vec<Point<f64>> = curve[hi..].iter().chain(&curve[..=lo]).copied().collect();

    let mut result = approximate_polygon_dp(&curve[lo..=hi], epsilon, false);
    result.pop();
    let mut back = approximate_polygon_dp(&wrapped, epsilon, false);
    back.pop();
    result.extend(back);
    result.into_iter().map(|p| Point2D::new(p.x, p.y)).collect()
}

// -- Lines ------------------------------------------------------------------

/// An infinite straight line, stored as a point on it and a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub point: Point2D,
    pub normal: Point2D,
}

impl Line {
    /// Total least squares fit through `points`.
    ///
    /// Returns `None` for fewer than two points or when they all coincide.
    pub fn fit(points: &[Point2D]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
        let cy = points.iter().map(|p| p.y).sum::<f64>() / n;

        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for p in points {
            let (dx, dy) = (p.x - cx, p.y - cy);
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
        }
        if sxx + syy < f64::EPSILON {
            return None;
        }

        // Principal axis of the scatter is the line direction.
        let angle = 0.5 * (2.0 * sxy).atan2(sxx - syy);
        let (sin, cos) = angle.sin_cos();
        Some(Self {
            point: Point2D::new(cx, cy),
            normal: Point2D::new(-sin, cos),
        })
    }

    /// Signed distance from the line, positive on the side the normal
    /// points to.
    pub fn signed_distance(&self, p: &Point2D) -> f64 {
        (p.x - self.point.x) * self.normal.x + (p.y - self.point.y) * self.normal.y
    }

    /// The same line with its normal pointing away from `inside`.
    pub fn facing_away_from(self, inside: &Point2D) -> Self {
        if self.signed_distance(inside) > 0.0 {
            Self {
                point: self.point,
                normal: Point2D::new(-self.normal.x, -self.normal.y),
            }
        } else {
            self
        }
    }

    /// The parallel line `distance` further along the normal.
    pub fn shifted(self, distance: f64) -> Self {
        Self {
            point: Point2D::new(
                self.point.x + self.normal.x * distance,
                self.point.y + self.normal.y * distance,
            ),
            normal: self.normal,
        }
    }

    /// The line halfway between `self` and a roughly parallel `other`.
    pub fn midline(&self, other: &Line) -> Option<Self> {
        let flip = if self.normal.x * other.normal.x + self.normal.y * other.normal.y < 0.0 {
            -1.0
        } else {
            1.0
        };
        let (nx, ny) = (
            self.normal.x + flip * other.normal.x,
            self.normal.y + flip * other.normal.y,
        );
        let length = nx.hypot(ny);
        if length < f64::EPSILON {
            return None;
        }
        Some(Self {
            point: self.point.midpoint(&other.point),
            normal: Point2D::new(nx / length, ny / length),
        })
    }

    /// Crossing point of two lines, `None` when they are (nearly) parallel.
    pub fn intersect(&self, other: &Line) -> Option<Point2D> {
        let (a, b) = (self.normal, other.normal);
        let det = a.x * b.y - a.y * b.x;
        if det.abs() < 1e-9 {
            return None;
        }
        let ca = a.x * self.point.x + a.y * self.point.y;
        let cb = b.x * other.point.x + b.y * other.point.y;
        Some(Point2D::new(
            (ca * b.y - cb * a.y) / det,
            (a.x * cb - b.x * ca) / det,
        ))
    }
}

fn farthest_from(points: &[Point2D], origin: &Point2D) -> usize {
    let mut best = 0;
    let mut best_dist = -1.0;
    for (i, p) in points.iter().enumerate() {
        let d = euclidean_distance(p, origin);
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Index of the point with the smallest key (lexicographic, total order).
fn argmin_by(pts: &[Point2D; 4], key: impl Fn(&Point2D) -> (f64, f64, f64)) -> usize {
    let mut best = 0;
    for i in 1..4 {
        let (a, b) = (key(&pts[i]), key(&pts[best]));
        let less = a
            .0
            .total_cmp(&b.0)
            .then(a.1.total_cmp(&b.1))
            .then(a.2.total_cmp(&b.2))
            .is_lt();
        if less {
            best = i;
        }
    }
    best
}

/// Clockwise (in image space) walk around the centroid, starting from the
/// point with the smallest `x + y`.
fn order_by_angle(pts: &[Point2D; 4]) -> [Point2D; 4] {
    let cx = pts.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = pts.iter().map(|p| p.y).sum::<f64>() / 4.0;

    let mut sorted = *pts;
    sorted.sort_by(|a, b| {
        let angle_a = (a.y - cy).atan2(a.x - cx);
        let angle_b = (b.y - cy).atan2(b.x - cx);
        angle_a
            .total_cmp(&angle_b)
            .then(a.y.total_cmp(&b.y))
            .then(a.x.total_cmp(&b.x))
    });

    let start = argmin_by(&sorted, |p| (p.x + p.y, p.y, p.x));
    sorted.rotate_left(start);
    sorted
}
