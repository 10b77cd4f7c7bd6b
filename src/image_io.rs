use std::path::{Path, PathBuf};
use image::{DynamicImage, ImageFormat};

use crate::errors::{GrainError, Result};

/// Represents an input image with its metadata
pub struct InputImage {
    pub image: DynamicImage,
    pub path: PathBuf,
    pub filename: String,
    /// Lower-case extension, reused for the diagnostic images
    pub extension: String,
}

/// Load an image of any format the `image` crate can decode
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<InputImage> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(GrainError::InvalidPath(path.to_path_buf()));
    }

    // Get filename without extension
    let filename = path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| GrainError::InvalidPath(path.to_path_buf()))?
        .to_string();

    let extension = path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .ok_or_else(|| GrainError::InvalidPath(path.to_path_buf()))?;

    let image = image::open(path)?;

    Ok(InputImage {
        image,
        path: path.to_path_buf(),
        filename,
        extension,
    })
}

/// Save an image, choosing the encoder from the path's extension
pub fn save_image<P: AsRef<Path>>(image: &DynamicImage, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)?;

    // JPEG has no alpha channel
    if format == ImageFormat::Jpeg && image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(path, format)?;
    } else {
        image.save_with_format(path, format)?;
    }

    Ok(())
}
