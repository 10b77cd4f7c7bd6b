// src/sampling.rs - Slicing pixel data out of crop regions

use image::imageops::{self, FilterType};
use image::{GenericImageView, ImageBuffer, Pixel, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::crop_planner::CropRegion;

/// Fill used for the border added by `pad_image`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PadType {
    /// Constant colour
    Color { color: [u8; 3] },
    /// Repeat the nearest edge pixel
    Replicate,
}

impl Default for PadType {
    fn default() -> Self {
        PadType::Color { color: [0, 0, 0] }
    }
}

/// Pixel window of one crop region after inflating by the margin and
/// clamping to the image. `None` when nothing of the window is on the image.
pub fn clamped_window(region: &CropRegion, margin: u32, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let margin = margin as i64;
    let x1 = (region.top_left.x as i64 - margin).clamp(0, width as i64);
    let y1 = (region.top_left.y as i64 - margin).clamp(0, height as i64);
    let x2 = (region.bottom_right.x as i64 + margin).clamp(0, width as i64);
    let y2 = (region.bottom_right.y as i64 + margin).clamp(0, height as i64);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some((x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32))
}

/// Copy out every crop region that overlaps the image
pub fn sample_crops<I>(
    image: &I,
    regions: &[CropRegion],
    margin: u32,
) -> Vec<(usize, ImageBuffer<I::Pixel, Vec<<I::Pixel as Pixel>::Subpixel>>)>
where
    I: GenericImageView + 'static,
{
    let (width, height) = image.dimensions();

    regions
        .iter()
        .filter_map(|region| {
            let (x, y, w, h) = clamped_window(region, margin, width, height)?;
            Some((region.boundary_id, image.view(x, y, w, h).to_image()))
        })
        .collect()
}

/// Centre the image on a `(height, width)` canvas. Odd leftover goes to the
/// bottom and right. An image larger than the canvas is cut to fit.
pub fn pad_image(image: &RgbImage, (height, width): (u32, u32), pad: PadType) -> RgbImage {
    let (img_w, img_h) = image.dimensions();
    let top = (height as i64 - img_h as i64) / 2;
    let left = (width as i64 - img_w as i64) / 2;

    match pad {
        PadType::Replicate if img_w > 0 && img_h > 0 => RgbImage::from_fn(width, height, |x, y| {
            let sx = (x as i64 - left).clamp(0, img_w as i64 - 1) as u32;
            let sy = (y as i64 - top).clamp(0, img_h as i64 - 1) as u32;
            *image.get_pixel(sx, sy)
        }),
        PadType::Replicate => RgbImage::new(width, height),
        PadType::Color { color } => {
            let mut canvas = RgbImage::from_pixel(width, height, Rgb(color));
            imageops::replace(&mut canvas, image, left, top);
            canvas
        }
    }
}

/// Scale to the given width or height, keeping the aspect ratio.
/// Cubic filtering when enlarging, triangle when shrinking.
pub fn resize_image(image: &RgbImage, width: Option<u32>, height: Option<u32>) -> RgbImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }

    let (new_w, new_h, enlarging) = match (width, height) {
        (Some(width), _) => {
            let ratio = width as f64 / w as f64;
            (width, (h as f64 * ratio) as u32, width > w)
        }
        (None, Some(height)) => {
            let ratio = height as f64 / h as f64;
            ((w as f64 * ratio) as u32, height, height > h)
        }
        (None, None) => return image.clone(),
    };

    let filter = if enlarging { FilterType::CatmullRom } else { FilterType::Triangle };
    imageops::resize(image, new_w.max(1), new_h.max(1), filter)
}

/// Resize so the longer side fits `(height, width)`, then pad to exactly that size
pub fn resize_and_pad(image: &RgbImage, (height, width): (u32, u32), pad: PadType) -> RgbImage {
    let (img_w, img_h) = image.dimensions();

    // Scale by whichever side is tighter so the result never overflows the canvas
    let resized = if (img_w as u64) * (height as u64) > (img_h as u64) * (width as u64) {
        resize_image(image, Some(width), None)
    } else {
        resize_image(image, None, Some(height))
    };

    pad_image(&resized, (height, width), pad)
}
