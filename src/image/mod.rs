//! Image normalization and background removal
//!
//! Downsizes oversized images to a processing-safe bound, runs the
//! background-removal model, restores original dimensions, and caches
//! results by content digest so identical inputs never redo the model call.

pub mod mock;
pub mod normalizer;
pub mod remover;

pub use mock::MockBackgroundModel;
pub use normalizer::SizeNormalizer;
pub use remover::BackgroundRemover;

use crate::Result;
use image::DynamicImage;

/// Opaque background-removal model: image in, image with an alpha matte
/// out. CPU-bound and synchronous; the remover dispatches it off the event
/// loop. Treated as deterministic for caching purposes.
pub trait BackgroundModel: Send + Sync {
    fn transform(&self, image: DynamicImage) -> Result<DynamicImage>;
}
