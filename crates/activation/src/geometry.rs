//! Screen geometry primitives.
//!
//! All coordinates are global screen points with the origin at the top-left
//! and `y` growing downward.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle. Containment is half-open: the min edges are
/// inside, the max edges are not.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    pub fn mid_x(&self) -> f64 {
        self.origin.x + self.size.width / 2.0
    }

    pub fn is_empty(&self) -> bool {
        self.size.width <= 0.0 || self.size.height <= 0.0
    }

    pub fn contains(&self, point: Point) -> bool {
        !self.is_empty()
            && point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }

    /// Grow the rectangle by `margin` on every side. Negative margins shrink
    /// it, never below zero size.
    pub fn grow(&self, margin: f64) -> Rect {
        Rect::new(
            self.origin.x - margin,
            self.origin.y - margin,
            (self.size.width + margin * 2.0).max(0.0),
            (self.size.height + margin * 2.0).max(0.0),
        )
    }

    /// A rectangle of `size` horizontally centred on this one and flush
    /// with its top edge.
    pub fn top_center(&self, size: Size) -> Rect {
        Rect::new(
            self.mid_x() - size.width / 2.0,
            self.origin.y,
            size.width,
            size.height,
        )
    }
}
