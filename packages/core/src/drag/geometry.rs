//! Geometric primitives for pointer hit testing.

use serde::{Deserialize, Serialize};

/// A point in viewport coordinates (origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by a delta.
    #[inline]
    pub fn offset(self, delta: Point) -> Point {
        Point::new(self.x + delta.x, self.y + delta.y)
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// An axis-aligned rectangle, as reported by a bounding-box measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if a point is inside the rectangle. Edges are inclusive on all
    /// four sides, matching a `left <= x <= right` bounding-box test.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// The same rectangle moved by a delta.
    #[inline]
    pub fn translate(&self, delta: Point) -> Rect {
        Rect::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }
}

/// Root-zone containment test shared by drag-move (visual hinting) and
/// drag-end (final decision), so both always agree.
///
/// Returns `false` when no zone has been measured.
#[inline]
pub fn pointer_in_zone(pointer: Point, zone: Option<&Rect>) -> bool {
    zone.map(|rect| rect.contains(pointer)).unwrap_or(false)
}
