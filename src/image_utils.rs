// src/image_utils.rs - Grayscale, blur, automatic threshold and edge detection

use image::{DynamicImage, GrayImage};
use imageproc::contrast::{otsu_level, threshold};
use imageproc::edges::canny;
use imageproc::filter::separable_filter_equal;

use crate::config::ClassParams;

/// Binary foreground image plus the threshold level that produced it
pub struct Binarized {
    pub image: GrayImage,
    pub level: u8,
}

/// Normalised 1-D Gaussian kernel of odd length `size`
pub fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let size = size.max(1) | 1;
    let half = (size / 2) as i32;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let weights: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / two_sigma_sq).exp())
        .collect();
    let sum: f32 = weights.iter().sum();

    weights.into_iter().map(|w| w / sum).collect()
}

/// Blur with a square Gaussian window of the configured size
pub fn blur(image: &GrayImage, size: u32, sigma: f32) -> GrayImage {
    let kernel = gaussian_kernel(size, sigma);
    separable_filter_equal(image, &kernel)
}

/// Grayscale, blur and threshold at Otsu's level (255 above, 0 otherwise)
pub fn binarize(image: &DynamicImage, params: &ClassParams) -> Binarized {
    let gray = image.to_luma8();
    let blurred = blur(&gray, params.blur_size, params.blur_sigma);
    let level = otsu_level(&blurred);

    log::debug!("Otsu level {} (configured seed {})", level, params.otsu_seed);

    Binarized {
        image: threshold(&blurred, level),
        level,
    }
}

/// Canny edges of the binary image
pub fn detect_edges(binary: &GrayImage, params: &ClassParams) -> GrayImage {
    canny(binary, params.canny_threshold, params.canny_high())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use crate::outlier_filter::FilterPolicy;
    use image::Luma;

    fn params() -> ClassParams {
        ClassParams {
            blur_size: 3,
            blur_sigma: 1.0,
            otsu_seed: 125,
            canny_threshold: 50.0,
            canny_ratio: 2.0,
            policy: FilterPolicy::LowerBoundOnly,
        }
    }

    #[test]
    fn kernel_is_normalised_and_symmetric() {
        let kernel = gaussian_kernel(7, 2.0);
        assert_eq!(kernel.len(), 7);
        assert_approx_eq!(kernel.iter().sum::<f32>(), 1.0, 1e-5);
        for i in 0..3 {
            assert_approx_eq!(kernel[i], kernel[6 - i], 1e-7);
        }
        assert!(kernel[3] > kernel[2]);
    }

    #[test]
    fn even_kernel_size_is_rounded_up() {
        assert_eq!(gaussian_kernel(4, 1.0).len(), 5);
    }

    #[test]
    fn binarize_separates_bright_disc() {
        let image = GrayImage::from_fn(40, 40, |x, y| {
            let (dx, dy) = (x as i32 - 20, y as i32 - 20);
            Luma([if dx * dx + dy * dy <= 100 { 220 } else { 30 }])
        });
        let binary = binarize(&DynamicImage::ImageLuma8(image), &params());
        assert!(binary.level >= 30 && binary.level < 220);
        assert_eq!(binary.image.get_pixel(20, 20)[0], 255);
        assert_eq!(binary.image.get_pixel(2, 2)[0], 0);
    }

    #[test]
    fn edges_outline_the_disc() {
        let binary = GrayImage::from_fn(40, 40, |x, y| {
            let (dx, dy) = (x as i32 - 20, y as i32 - 20);
            Luma([if dx * dx + dy * dy <= 100 { 255 } else { 0 }])
        });
        let edges = detect_edges(&binary, &params());
        assert_eq!(edges.get_pixel(20, 20)[0], 0);
        assert!(edges.pixels().any(|p| p[0] > 0));
    }
}
