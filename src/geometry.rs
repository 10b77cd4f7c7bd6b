// src/geometry.rs - Plain data records shared by every pipeline stage

use serde::{Deserialize, Serialize};

/// Integer pixel coordinate, x to the right and y downward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<imageproc::point::Point<i32>> for Point {
    fn from(p: imageproc::point::Point<i32>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Point> for imageproc::point::Point<i32> {
    fn from(p: Point) -> Self {
        imageproc::point::Point::new(p.x, p.y)
    }
}

/// Axis-aligned bounding box; `size` is `(right - left, bottom - top)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top_left: Point,
    pub bottom_right: Point,
    pub size: (u32, u32),
}

impl BoundingBox {
    pub fn left(&self) -> i32 {
        self.top_left.x
    }

    pub fn top(&self) -> i32 {
        self.top_left.y
    }

    pub fn right(&self) -> i32 {
        self.bottom_right.x
    }

    pub fn bottom(&self) -> i32 {
        self.bottom_right.y
    }
}

/// Enclosing circle rounded to whole pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub x: i32,
    pub y: i32,
    pub r: i32,
}

/// Exact enclosing circle before rounding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnclosingCircle {
    pub center: (f64, f64),
    pub radius: f64,
}

impl EnclosingCircle {
    /// Round center and radius to the nearest pixel.
    /// Truncating instead would shrink radii by up to a pixel and can move a
    /// radius across a `TightBand` edge, so results differ from truncating
    /// tools at the band boundary.
    pub fn rounded(&self) -> Circle {
        Circle {
            x: self.center.0.round() as i32,
            y: self.center.1.round() as i32,
            r: self.radius.round().max(0.0) as i32,
        }
    }

    pub fn contains(&self, point: Point, epsilon: f64) -> bool {
        let dx = point.x as f64 - self.center.0;
        let dy = point.y as f64 - self.center.1;
        (dx * dx + dy * dy).sqrt() <= self.radius + epsilon
    }
}

/// One fitted boundary: its id, enclosing circle and bounding box travel together
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    pub boundary_id: usize,
    pub circle: Circle,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}
