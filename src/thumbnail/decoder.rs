//! Decoding and resizing source images into thumbnails.

use image::imageops::FilterType;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Bounding box a thumbnail is resized to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

impl ThumbnailSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ThumbnailSize {
    /// Card preview size used by the grid.
    fn default() -> Self {
        Self::new(220, 200)
    }
}

impl std::fmt::Display for ThumbnailSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Errors that can occur while producing a thumbnail.
///
/// The cache folds all of these into "no thumbnail".
#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// The file could not be inspected.
    #[error("Failed to read {0}: {1}")]
    Io(String, #[source] std::io::Error),

    /// The path exists but is not a regular file.
    #[error("Not a regular file: {0}")]
    NotAFile(String),

    /// The file is not a decodable image.
    #[error("Failed to decode image {0}: {1}")]
    Decode(String, #[source] image::ImageError),
}

/// Turns an image file into a bitmap that fits within a bound.
///
/// Implementations must preserve the aspect ratio.
pub trait ThumbnailDecoder: Send + Sync {
    fn decode(&self, path: &Path, size: ThumbnailSize) -> Result<RgbaImage, ThumbnailError>;
}

/// Decoder backed by the `image` crate, resampling with Lanczos3.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

impl ThumbnailDecoder for ImageDecoder {
    fn decode(&self, path: &Path, size: ThumbnailSize) -> Result<RgbaImage, ThumbnailError> {
        let img = image::open(path)
            .map_err(|e| ThumbnailError::Decode(path.display().to_string(), e))?;
        let thumb = img.resize(size.width, size.height, FilterType::Lanczos3);
        Ok(thumb.to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_resize_keeps_aspect_ratio() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.png");
        image::RgbImage::new(400, 200).save(&path).unwrap();

        let thumb = ImageDecoder.decode(&path, ThumbnailSize::new(100, 100)).unwrap();
        assert_eq!(thumb.dimensions(), (100, 50));
    }

    #[test]
    fn test_decode_rejects_non_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.png");
        fs::write(&path, "not an image").unwrap();

        let result = ImageDecoder.decode(&path, ThumbnailSize::default());
        assert!(matches!(result, Err(ThumbnailError::Decode(..))));
    }

    #[cfg(feature = "jpeg")]
    #[test]
    fn test_decodes_jpeg_cover() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cover.jpg");
        image::RgbImage::from_pixel(300, 150, image::Rgb([200, 40, 40]))
            .save(&path)
            .unwrap();

        let thumb = ImageDecoder.decode(&path, ThumbnailSize::new(100, 100)).unwrap();
        assert_eq!(thumb.dimensions(), (100, 50));
        // Lossy, but a solid red stays red
        let pixel = thumb.get_pixel(50, 25);
        assert!(pixel[0] > 150 && pixel[1] < 100 && pixel[2] < 100);
    }

    #[test]
    fn test_size_display() {
        assert_eq!(ThumbnailSize::new(220, 200).to_string(), "220x200");
    }
}
