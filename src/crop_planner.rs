// src/crop_planner.rs - Fixed-size crop windows around accepted grains

use serde::Serialize;

use crate::geometry::{Candidate, Point};

/// Square window centred on a grain. Not clamped to the image; a grain near
/// the edge yields a window that extends past the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRegion {
    pub boundary_id: usize,
    pub top_left: Point,
    pub bottom_right: Point,
}

impl CropRegion {
    /// Side lengths along x and y
    pub fn side(&self) -> (i32, i32) {
        (
            self.bottom_right.x - self.top_left.x,
            self.bottom_right.y - self.top_left.y,
        )
    }

    /// True when the whole window lies inside `[0, width] x [0, height]`
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.top_left.x >= 0
            && self.top_left.y >= 0
            && self.bottom_right.x <= width as i32
            && self.bottom_right.y <= height as i32
    }
}

/// One crop region per accepted candidate, in the same order
pub fn plan_crops(accepted: &[Candidate], crop_size: u32) -> Vec<CropRegion> {
    let margin = (crop_size / 2) as i32;

    accepted
        .iter()
        .map(|c| CropRegion {
            boundary_id: c.boundary_id,
            top_left: Point::new(c.circle.x - margin, c.circle.y - margin),
            bottom_right: Point::new(c.circle.x + margin, c.circle.y + margin),
        })
        .collect()
}
