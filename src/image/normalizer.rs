use image::{imageops::FilterType, DynamicImage};

/// Longest image side the background-removal model handles comfortably.
pub const MAX_DIMENSION: u32 = 1500;

/// Shrinks oversized images for processing and restores their original
/// dimensions afterwards. Dimensions round-trip exactly; pixel content is
/// expected to change in between.
pub struct SizeNormalizer;

impl SizeNormalizer {
    /// Scale the image down proportionally so its longer side equals
    /// [`MAX_DIMENSION`], returning the original size so it can be restored.
    /// Images already within the bound pass through unchanged with `None`.
    pub fn shrink(image: DynamicImage) -> (DynamicImage, Option<(u32, u32)>) {
        let (width, height) = (image.width(), image.height());
        if width.max(height) <= MAX_DIMENSION {
            return (image, None);
        }

        tracing::info!("Resizing image from {}x{}", width, height);
        let resized = image.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3);
        tracing::info!("Image resized to {}x{}", resized.width(), resized.height());
        (resized, Some((width, height)))
    }

    /// Inverse of [`Self::shrink`]: scale back to the recorded dimensions,
    /// or pass through when no resize occurred.
    pub fn restore(image: DynamicImage, original_size: Option<(u32, u32)>) -> DynamicImage {
        match original_size {
            Some((width, height)) => {
                tracing::info!("Restoring image to original size {}x{}", width, height);
                image.resize_exact(width, height, FilterType::Lanczos3)
            }
            None => image,
        }
    }
}
