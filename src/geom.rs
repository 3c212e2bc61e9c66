//! Point and rectangle primitives in canvas units.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

use crate::consts::MIN_SIZE;

/// A point in either screen or canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise offset from `origin` to `self`.
    #[must_use]
    pub fn delta_from(self, origin: Point) -> Point {
        Point { x: self.x - origin.x, y: self.y - origin.y }
    }

    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Point {
        Point { x: self.x + dx, y: self.y + dy }
    }
}

/// Axis-aligned rectangle: top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Area, treating negative extents as empty.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Area of the overlap between `self` and `other`; zero when disjoint.
    #[must_use]
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let w = self.right().min(other.right()) - self.left().max(other.left());
        let h = self.bottom().min(other.bottom()) - self.top().max(other.top());
        if w <= 0.0 || h <= 0.0 {
            return 0.0;
        }
        w * h
    }

    /// Whether the two rectangles overlap or touch.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && other.left() <= self.right()
            && self.top() <= other.bottom()
            && other.top() <= self.bottom()
    }

    #[must_use]
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Same size, new top-left corner.
    #[must_use]
    pub fn at(&self, origin: Point) -> Rect {
        Rect { x: origin.x, y: origin.y, ..*self }
    }

    #[must_use]
    pub fn translated(&self, dx: f64, dy: f64) -> Rect {
        Rect { x: self.x + dx, y: self.y + dy, ..*self }
    }

    /// Grow on every side by `margin`.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Rect {
        Rect {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }

    /// Point where the ray from the centre toward `target` leaves the rect.
    /// Returns `target` itself when it lies inside.
    #[must_use]
    pub fn boundary_toward(&self, target: Point) -> Point {
        let c = self.center();
        let dx = target.x - c.x;
        let dy = target.y - c.y;
        let tx = if dx == 0.0 { f64::INFINITY } else { (self.width / 2.0) / dx.abs() };
        let ty = if dy == 0.0 { f64::INFINITY } else { (self.height / 2.0) / dy.abs() };
        let t = tx.min(ty);
        if t >= 1.0 {
            return target;
        }
        Point::new(c.x + dx * t, c.y + dy * t)
    }

    /// Replace non-finite coordinates with zero and clamp the size to [`MIN_SIZE`].
    #[must_use]
    pub fn sanitized(&self) -> Rect {
        Rect {
            x: finite_or_zero(self.x),
            y: finite_or_zero(self.y),
            width: clamp_size(self.width),
            height: clamp_size(self.height),
        }
    }
}

/// `v` if finite, otherwise `0.0`.
#[must_use]
pub fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Clamp a width or height to at least [`MIN_SIZE`]; non-finite becomes [`MIN_SIZE`].
#[must_use]
pub fn clamp_size(v: f64) -> f64 {
    if v.is_finite() { v.max(MIN_SIZE) } else { MIN_SIZE }
}

/// Normalize degrees into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }
    let r = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if r >= 360.0 { 0.0 } else { r }
}
