//! Plane geometry primitives shared by every crate.
//!
//! All coordinates are canvas units (already transformed into the
//! drawable space of the plotter).

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Represents a 2D point with X and Y coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point with the given X and Y coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculates the distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Squared distance, for comparisons in hot loops.
    pub fn distance_sq(&self, other: &Point) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn cross(&self, other: &Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Linear interpolation towards `other`.
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        self.lerp(other, 0.5)
    }

    /// Unit vector for an angle given in degrees.
    pub fn from_angle(angle_deg: f64) -> Point {
        let rad = angle_deg.to_radians();
        Point::new(rad.cos(), rad.sin())
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Distance from this point to the segment `a`-`b`.
    pub fn distance_to_segment(&self, a: &Point, b: &Point) -> f64 {
        let ab = *b - *a;
        let len_sq = ab.dot(&ab);
        if len_sq < f64::EPSILON {
            return self.distance_to(a);
        }
        let t = ((*self - *a).dot(&ab) / len_sq).clamp(0.0, 1.0);
        self.distance_to(&a.lerp(b, t))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            min: Point::new(x, y),
            max: Point::new(x + width, y + height),
        }
    }

    /// Smallest rectangle containing every point, `None` when empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut rect = Rect {
            min: first,
            max: first,
        };
        for p in iter {
            rect.min.x = rect.min.x.min(p.x);
            rect.min.y = rect.min.y.min(p.y);
            rect.max.x = rect.max.x.max(p.x);
            rect.max.y = rect.max.y.max(p.y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        self.min.midpoint(&self.max)
    }

    pub fn diagonal(&self) -> f64 {
        self.min.distance_to(&self.max)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Grows the rectangle by `amount` on every side.
    pub fn inflate(&self, amount: f64) -> Rect {
        Rect {
            min: Point::new(self.min.x - amount, self.min.y - amount),
            max: Point::new(self.max.x + amount, self.max.y + amount),
        }
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Clips the segment `a`-`b` to this rectangle (Liang-Barsky).
    ///
    /// Returns `None` when the segment never enters the rectangle.
    pub fn clip_segment(&self, a: Point, b: Point) -> Option<(Point, Point)> {
        let d = b - a;
        let mut t0 = 0.0f64;
        let mut t1 = 1.0f64;
        let checks = [
            (-d.x, a.x - self.min.x),
            (d.x, self.max.x - a.x),
            (-d.y, a.y - self.min.y),
            (d.y, self.max.y - a.y),
        ];
        for (p, q) in checks {
            if p.abs() < f64::EPSILON {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return None;
            }
        }
        Some((a + d * t0, a + d * t1))
    }
}

/// Total length of an open polyline.
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Shoelace signed area; positive for counter-clockwise rings.
pub fn signed_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..points.len() {
        let p1 = points[i];
        let p2 = points[(i + 1) % points.len()];
        area += p1.x * p2.y - p2.x * p1.y;
    }
    area / 2.0
}

/// Area centroid of a ring, falling back to the vertex mean for
/// zero-area input.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let area = signed_area(points);
    if area.abs() < 1e-9 {
        let n = points.len() as f64;
        let sum = points.iter().fold(Point::default(), |acc, p| acc + *p);
        return Some(sum * (1.0 / n));
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..points.len() {
        let p1 = points[i];
        let p2 = points[(i + 1) % points.len()];
        let f = p1.x * p2.y - p2.x * p1.y;
        cx += (p1.x + p2.x) * f;
        cy += (p1.y + p2.y) * f;
    }
    Some(Point::new(cx / (6.0 * area), cy / (6.0 * area)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_clip_segment() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let (a, b) = rect
            .clip_segment(Point::new(-5.0, 5.0), Point::new(15.0, 5.0))
            .unwrap();
        assert_eq!(a, Point::new(0.0, 5.0));
        assert_eq!(b, Point::new(10.0, 5.0));

        assert!(rect
            .clip_segment(Point::new(-5.0, 20.0), Point::new(15.0, 20.0))
            .is_none());
    }

    #[test]
    fn test_signed_area_and_centroid() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!((signed_area(&square) - 100.0).abs() < 1e-9);
        let c = centroid(&square).unwrap();
        assert!((c.x - 5.0).abs() < 1e-9 && (c.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_to_segment() {
        let p = Point::new(5.0, 3.0);
        let d = p.distance_to_segment(&Point::new(0.0, 0.0), &Point::new(10.0, 0.0));
        assert!((d - 3.0).abs() < 1e-9);
    }
}
