use super::BackgroundModel;
use crate::{Error, Result};
use image::DynamicImage;
use std::sync::{Arc, Mutex};

/// Counting stand-in for the background-removal model. Returns the input
/// with an alpha channel, clearing the corner pixel so the matte is
/// observable in tests.
#[derive(Clone)]
pub struct MockBackgroundModel {
    transform_count: Arc<Mutex<usize>>,
    max_seen_dimension: Arc<Mutex<u32>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockBackgroundModel {
    pub fn new() -> Self {
        Self {
            transform_count: Arc::new(Mutex::new(0)),
            max_seen_dimension: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_transform_count(&self) -> usize {
        *self.transform_count.lock().unwrap()
    }

    /// Longest side of the largest image the model has been handed.
    pub fn max_seen_dimension(&self) -> u32 {
        *self.max_seen_dimension.lock().unwrap()
    }
}

impl Default for MockBackgroundModel {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundModel for MockBackgroundModel {
    fn transform(&self, image: DynamicImage) -> Result<DynamicImage> {
        if *self.should_fail.lock().unwrap() {
            return Err(Error::Processing("Mock model failure".to_string()));
        }

        *self.transform_count.lock().unwrap() += 1;
        let mut max_seen = self.max_seen_dimension.lock().unwrap();
        *max_seen = (*max_seen).max(image.width().max(image.height()));

        let mut rgba = image.to_rgba8();
        if let Some(pixel) = rgba.get_pixel_mut_checked(0, 0) {
            pixel[3] = 0;
        }
        Ok(DynamicImage::ImageRgba8(rgba))
    }
}
