//! Geometry kernel for plan coordinates.
//!
//! Pure functions over points, polygons and axis-aligned boxes. Nothing here
//! panics on malformed input: a polygon with fewer than three points simply
//! has zero area and contains nothing.

use serde::{Deserialize, Serialize};

/// A point in plan coordinates (one unit = one meter).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation towards `other`; `t = 0` is `self`.
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub const fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Box of the given extents centered on `center`.
    pub fn from_center(center: Point, width: f64, height: f64) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self::new(center.x - hw, center.x + hw, center.y - hh, center.y + hh)
    }

    pub fn width(&self) -> f64 {
        (self.max_x - self.min_x).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max_y - self.min_y).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }

    /// The four corners, counter-clockwise from (min_x, min_y).
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }

    /// Grow (or shrink, for negative values) on every side.
    pub fn expand(&self, margin: f64) -> Bounds {
        self.expand_xy(margin, margin)
    }

    pub fn expand_xy(&self, dx: f64, dy: f64) -> Bounds {
        Bounds::new(
            self.min_x - dx,
            self.max_x + dx,
            self.min_y - dy,
            self.max_y + dy,
        )
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Strict overlap: boxes that merely touch (within `EPSILON`) do not overlap.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min_x < other.max_x - EPSILON
            && other.min_x < self.max_x - EPSILON
            && self.min_y < other.max_y - EPSILON
            && other.min_y < self.max_y - EPSILON
    }

    /// Separation along the most separating axis. Negative when the boxes
    /// overlap on both axes.
    pub fn gap(&self, other: &Bounds) -> f64 {
        let gx = (other.min_x - self.max_x).max(self.min_x - other.max_x);
        let gy = (other.min_y - self.max_y).max(self.min_y - other.max_y);
        gx.max(gy)
    }

    /// Closest point of this box to `p` (`p` itself when inside).
    pub fn clamp(&self, p: &Point) -> Point {
        Point::new(
            p.x.clamp(self.min_x, self.max_x),
            p.y.clamp(self.min_y, self.max_y),
        )
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::new(
            self.min_x.min(other.min_x),
            self.max_x.max(other.max_x),
            self.min_y.min(other.min_y),
            self.max_y.max(other.max_y),
        )
    }
}

/// Tolerance for touching-edge comparisons.
pub const EPSILON: f64 = 1e-9;

/// Even-odd ray casting.
///
/// Points exactly on an edge may land on either side; coordinates are
/// continuous so this is left as a documented boundary case.
pub fn point_in_polygon(p: &Point, poly: &[Point]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = poly[i];
        let pj = poly[j];
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Shoelace formula, absolute value. Fewer than three points gives 0.
pub fn polygon_area(poly: &[Point]) -> f64 {
    signed_area(poly).abs()
}

fn signed_area(poly: &[Point]) -> f64 {
    if poly.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for (i, a) in poly.iter().enumerate() {
        let b = poly[(i + 1) % poly.len()];
        twice += a.x * b.y - b.x * a.y;
    }
    twice / 2.0
}

/// Area-weighted centroid; falls back to the vertex mean for degenerate
/// polygons. Empty input yields the origin.
pub fn polygon_centroid(poly: &[Point]) -> Point {
    if poly.is_empty() {
        return Point::default();
    }
    let area = signed_area(poly);
    if area.abs() < EPSILON {
        let n = poly.len() as f64;
        let (sx, sy) = poly
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        return Point::new(sx / n, sy / n);
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (i, a) in poly.iter().enumerate() {
        let b = poly[(i + 1) % poly.len()];
        let cross = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    Point::new(cx / (6.0 * area), cy / (6.0 * area))
}

/// Distance from `p` to the segment `a`–`b`, clamping the projection onto
/// the segment. A zero-length segment degrades to point distance.
pub fn distance_to_segment(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq < EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(&Point::new(a.x + t * dx, a.y + t * dy))
}

/// Minimum distance from `p` to any edge of the (closed) polygon.
///
/// This is a boundary distance: a point deep inside the polygon still gets
/// a positive value. Pair with [`point_in_polygon`] when containment matters.
/// Empty input returns `f64::INFINITY`.
pub fn distance_to_polygon(p: &Point, poly: &[Point]) -> f64 {
    match poly.len() {
        0 => f64::INFINITY,
        1 => p.distance(&poly[0]),
        n => (0..n)
            .map(|i| distance_to_segment(p, &poly[i], &poly[(i + 1) % n]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Zero when `p` is inside the polygon, otherwise the boundary distance.
pub fn clearance_to_polygon(p: &Point, poly: &[Point]) -> f64 {
    if point_in_polygon(p, poly) {
        0.0
    } else {
        distance_to_polygon(p, poly)
    }
}

/// Bounding box of a point set. Empty input yields an all-zero box.
pub fn bounds_of(points: &[Point]) -> Bounds {
    let Some(first) = points.first() else {
        return Bounds::default();
    };
    points.iter().skip(1).fold(
        Bounds::new(first.x, first.x, first.y, first.y),
        |b, p| Bounds::new(b.min_x.min(p.x), b.max_x.max(p.x), b.min_y.min(p.y), b.max_y.max(p.y)),
    )
}

/// Total length of an open polyline.
pub fn polyline_length(path: &[Point]) -> f64 {
    path.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// Axis-aligned rectangle polygon, counter-clockwise.
pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<Point> {
    Bounds::new(min_x, max_x, min_y, max_y).corners().to_vec()
}

/// Regular polygon approximating a circle (vertices on the circle).
pub fn circle_polygon(center: Point, radius: f64, segments: usize) -> Vec<Point> {
    let segments = segments.max(3);
    (0..segments)
        .map(|i| {
            let a = std::f64::consts::TAU * i as f64 / segments as f64;
            Point::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Vec<Point> {
        rectangle(0.0, 0.0, size, size)
    }

    #[test]
    fn test_rectangle_area() {
        let poly = rectangle(1.0, 2.0, 4.5, 9.0);
        assert!((polygon_area(&poly) - 3.5 * 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_area_ignores_winding() {
        let mut poly = square(4.0);
        poly.reverse();
        assert!((polygon_area(&poly) - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_polygon() {
        let line = vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)];
        assert_eq!(polygon_area(&line), 0.0);
        assert!(!point_in_polygon(&Point::new(1.0, 1.0), &line));
        assert_eq!(polygon_area(&[]), 0.0);
    }

    #[test]
    fn test_point_in_polygon() {
        let poly = square(10.0);
        assert!(point_in_polygon(&Point::new(5.0, 5.0), &poly));
        assert!(!point_in_polygon(&Point::new(15.0, 5.0), &poly));
        assert!(!point_in_polygon(&Point::new(-0.1, 5.0), &poly));
    }

    #[test]
    fn test_point_in_concave_polygon() {
        // L-shape: the notch at the top right is outside
        let poly = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 4.0),
            Point::new(4.0, 4.0),
            Point::new(4.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(point_in_polygon(&Point::new(2.0, 8.0), &poly));
        assert!(point_in_polygon(&Point::new(8.0, 2.0), &poly));
        assert!(!point_in_polygon(&Point::new(8.0, 8.0), &poly));
    }

    #[test]
    fn test_distance_to_segment_clamps() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((distance_to_segment(&Point::new(5.0, 3.0), &a, &b) - 3.0).abs() < 1e-12);
        assert!((distance_to_segment(&Point::new(13.0, 4.0), &a, &b) - 5.0).abs() < 1e-12);
        assert!((distance_to_segment(&Point::new(3.0, 4.0), &a, &a) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_to_polygon_uses_closing_edge() {
        let poly = square(10.0);
        // Nearest edge is the closing edge (0,10)->(0,0)
        let d = distance_to_polygon(&Point::new(-2.0, 5.0), &poly);
        assert!((d - 2.0).abs() < 1e-12);
        assert_eq!(clearance_to_polygon(&Point::new(5.0, 5.0), &poly), 0.0);
    }

    #[test]
    fn test_bounds_of() {
        let b = bounds_of(&[Point::new(3.0, -1.0), Point::new(-2.0, 4.0), Point::new(1.0, 1.0)]);
        assert_eq!(b, Bounds::new(-2.0, 3.0, -1.0, 4.0));
        assert_eq!(bounds_of(&[]), Bounds::default());
    }

    #[test]
    fn test_centroid_of_square() {
        let c = polygon_centroid(&square(4.0));
        assert!((c.x - 2.0).abs() < 1e-12 && (c.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_gap_and_overlap() {
        let a = Bounds::from_center(Point::new(0.0, 0.0), 2.0, 2.0);
        let b = Bounds::from_center(Point::new(4.0, 0.5), 2.0, 2.0);
        assert!((a.gap(&b) - 2.0).abs() < 1e-12);
        assert!(!a.overlaps(&b));
        let touching = Bounds::from_center(Point::new(2.0, 0.0), 2.0, 2.0);
        assert!(!a.overlaps(&touching));
        let inner = Bounds::from_center(Point::new(1.0, 1.0), 2.0, 2.0);
        assert!(a.overlaps(&inner));
        assert!(a.gap(&inner) < 0.0);
    }

    #[test]
    fn test_circle_polygon_area_approaches_pi_r2() {
        let poly = circle_polygon(Point::new(5.0, 5.0), 2.0, 64);
        let area = polygon_area(&poly);
        assert!((area - std::f64::consts::PI * 4.0).abs() < 0.1);
    }
}
