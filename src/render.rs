// src/render.rs - Diagnostic canvases for each pipeline stage

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::boundary::Hierarchy;
use crate::geometry::{Candidate, Circle, Point};
use crate::pipeline::Analysis;

pub const BOUNDARY_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const CIRCLE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const ACCEPTED_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Canvases written as `03` to `06`
pub struct Canvases {
    pub boundaries: RgbImage,
    pub shapes: RgbImage,
    pub refined: RgbImage,
    pub crops: RgbImage,
}

pub fn blank_canvas(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
}

/// Closed polyline through the points
pub fn draw_outline(canvas: &mut RgbImage, points: &[Point], color: Rgb<u8>) {
    if points.len() < 2 {
        if let Some(p) = points.first() {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < canvas.width() && (p.y as u32) < canvas.height() {
                canvas.put_pixel(p.x as u32, p.y as u32, color);
            }
        }
        return;
    }

    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        draw_line_segment_mut(canvas, (a.x as f32, a.y as f32), (b.x as f32, b.y as f32), color);
    }
}

pub fn draw_circle(canvas: &mut RgbImage, circle: &Circle, color: Rgb<u8>, thickness: i32) {
    for t in 0..thickness.max(1) {
        draw_hollow_circle_mut(canvas, (circle.x, circle.y), circle.r + t, color);
    }
}

/// Rectangle spanning both corners inclusively
pub fn draw_rect(canvas: &mut RgbImage, top_left: Point, bottom_right: Point, color: Rgb<u8>) {
    let width = (bottom_right.x - top_left.x).max(0) as u32 + 1;
    let height = (bottom_right.y - top_left.y).max(0) as u32 + 1;
    draw_hollow_rect_mut(canvas, Rect::at(top_left.x, top_left.y).of_size(width, height), color);
}

fn draw_top_level(canvas: &mut RgbImage, hierarchy: &Hierarchy, candidates: &[Candidate]) {
    for candidate in candidates {
        if let Some(border) = hierarchy.border(candidate.boundary_id) {
            draw_outline(canvas, &border.points, BOUNDARY_COLOR);
        }
    }
}

/// Render every diagnostic canvas for one analysed image
pub fn render_diagnostics(width: u32, height: u32, analysis: &Analysis) -> Canvases {
    let mut boundaries = blank_canvas(width, height);
    draw_top_level(&mut boundaries, &analysis.extraction.hierarchy, &analysis.candidates);

    let mut shapes = boundaries.clone();
    for candidate in &analysis.candidates {
        draw_circle(&mut shapes, &candidate.circle, CIRCLE_COLOR, 1);
        draw_rect(&mut shapes, candidate.bbox.top_left, candidate.bbox.bottom_right, BOX_COLOR);
    }

    let mut refined = boundaries.clone();
    for candidate in &analysis.filter.rejected {
        draw_circle(&mut refined, &candidate.circle, CIRCLE_COLOR, 1);
    }
    for candidate in &analysis.filter.accepted {
        draw_circle(&mut refined, &candidate.circle, ACCEPTED_COLOR, 2);
    }

    let mut crops = boundaries.clone();
    for region in &analysis.crops {
        draw_rect(&mut crops, region.top_left, region.bottom_right, BOX_COLOR);
    }

    Canvases { boundaries, shapes, refined, crops }
}
