//! Saving rendered depth maps as PNG files.

use std::path::Path;

use image::GrayImage;

/// Saves a grayscale image as a PNG file.
///
/// The parent directory is created if it does not exist.
///
/// # Errors
/// Returns an error if the extension is not `.png` or the file cannot be
/// written.
pub fn save_gray_png(path: &Path, image: &GrayImage) -> Result<(), ScreenshotError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if extension != "png" {
        return Err(ScreenshotError::UnsupportedFormat(extension));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Encodes a grayscale image as PNG in memory.
///
/// # Errors
/// Returns an error if encoding fails.
pub fn encode_gray_png(image: &GrayImage) -> Result<Vec<u8>, ScreenshotError> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Error type for saving depth maps.
#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("Failed to save image: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Unsupported image format: '{0}' (only png is written)")]
    UnsupportedFormat(String),
}
