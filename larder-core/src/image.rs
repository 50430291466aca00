//! Photo validation and encoding for vision extraction.
//!
//! Images are checked and base64-encoded, never re-encoded or resized.

use std::io::Cursor;

use futures::future::try_join_all;
use image::{ImageFormat, ImageReader};
use thiserror::Error;

use crate::ai::ImageData;

/// Allowed image formats for recipe photos.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum file size for one image (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Maximum number of photos in one extraction.
pub const MAX_IMAGES: usize = 5;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("No photos provided")]
    NoImages,

    #[error("Too many photos: {count} (max {max})")]
    TooMany { count: usize, max: usize },

    #[error("Photo {index} is too large: {size} bytes (max {max})")]
    TooLarge { index: usize, size: usize, max: usize },

    #[error("Photo {index} is not a usable image: {reason}")]
    Invalid { index: usize, reason: String },

    #[error("Image processing task failed: {0}")]
    Task(String),
}

/// Validate image data: check the format is allowed and the header decodes.
///
/// Returns the content type on success (e.g., "image/jpeg").
pub fn validate_image(data: &[u8]) -> Result<String, String> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("Failed to read image: {}", e))?;

    let format = reader
        .format()
        .ok_or_else(|| "Could not detect image format".to_string())?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(format!(
            "Unsupported image format: {:?}. Allowed: JPEG, PNG, GIF, WebP",
            format
        ));
    }

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| format!("Failed to read image header: {}", e))?;
    if width == 0 || height == 0 {
        return Err("Image has no pixels".to_string());
    }

    Ok(format.to_mime_type().to_string())
}

/// Check and encode one photo. `index` is 1-based, for error messages.
pub fn prepare_image(index: usize, data: &[u8]) -> Result<ImageData, ImageError> {
    if data.len() > MAX_FILE_SIZE {
        return Err(ImageError::TooLarge {
            index,
            size: data.len(),
            max: MAX_FILE_SIZE,
        });
    }

    let media_type =
        validate_image(data).map_err(|reason| ImageError::Invalid { index, reason })?;

    Ok(ImageData::from_bytes(media_type, data))
}

/// Check and encode every photo concurrently on the blocking pool.
///
/// All-or-nothing: the first failure is returned and nothing else is kept.
pub async fn prepare_images(images: Vec<Vec<u8>>) -> Result<Vec<ImageData>, ImageError> {
    if images.is_empty() {
        return Err(ImageError::NoImages);
    }
    if images.len() > MAX_IMAGES {
        return Err(ImageError::TooMany {
            count: images.len(),
            max: MAX_IMAGES,
        });
    }

    let tasks = images.into_iter().enumerate().map(|(i, data)| async move {
        tokio::task::spawn_blocking(move || prepare_image(i + 1, &data))
            .await
            .map_err(|e| ImageError::Task(e.to_string()))?
    });

    let prepared = try_join_all(tasks).await?;
    tracing::debug!(count = prepared.len(), "photos prepared");
    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn png_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(2, 2))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn validate_png() {
        assert_eq!(validate_image(&png_bytes()).unwrap(), "image/png");
    }

    #[test]
    fn truncated_jpeg_is_rejected() {
        let jpeg_header = [0xFF, 0xD8, 0xFF, 0xE0];
        assert!(validate_image(&jpeg_header).is_err());
    }

    #[test]
    fn invalid_format_is_rejected() {
        assert!(validate_image(b"not an image").is_err());
    }

    #[test]
    fn prepared_image_is_base64() {
        let image = prepare_image(1, &png_bytes()).unwrap();
        assert_eq!(image.media_type, "image/png");
        assert!(image.data_url().starts_with("data:image/png;base64,iVBOR"));
    }

    #[tokio::test]
    async fn prepares_all_images() {
        let prepared = prepare_images(vec![png_bytes(), png_bytes()]).await.unwrap();
        assert_eq!(prepared.len(), 2);
    }

    #[tokio::test]
    async fn one_bad_image_fails_the_batch() {
        let err = prepare_images(vec![png_bytes(), b"garbage".to_vec()])
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::Invalid { index: 2, .. }));
    }

    #[tokio::test]
    async fn count_limits() {
        assert!(matches!(
            prepare_images(vec![]).await,
            Err(ImageError::NoImages)
        ));
        assert!(matches!(
            prepare_images(vec![png_bytes(); MAX_IMAGES + 1]).await,
            Err(ImageError::TooMany { count: 6, .. })
        ));
    }
}
