use super::{BackgroundModel, SizeNormalizer};
use crate::{Error, Result};
use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// Default maximum number of cached background-removal results.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

fn content_digest(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}

/// Bounded map from content digest to result bytes. Entries never mutate
/// after insertion; once the count exceeds capacity, the oldest fifth is
/// evicted in insertion order.
struct ResultCache {
    capacity: usize,
    entries: HashMap<String, Vec<u8>>,
    order: VecDeque<String>,
}

impl ResultCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, digest: &str) -> Option<Vec<u8>> {
        self.entries.get(digest).cloned()
    }

    fn insert(&mut self, digest: String, result: Vec<u8>) {
        if self.entries.insert(digest.clone(), result).is_none() {
            self.order.push_back(digest);
        }

        if self.entries.len() > self.capacity {
            let evict = (self.capacity / 5).max(1);
            tracing::info!(
                "Background-removal cache over capacity ({} > {}), evicting {} oldest entries",
                self.entries.len(),
                self.capacity,
                evict
            );
            for _ in 0..evict {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Runs the background-removal model over normalized images and caches
/// results by content digest, so repeated requests for the same image never
/// redo the expensive model call.
#[derive(Clone)]
pub struct BackgroundRemover {
    model: Arc<dyn BackgroundModel>,
    cache: Arc<Mutex<ResultCache>>,
}

impl BackgroundRemover {
    pub fn new(model: Arc<dyn BackgroundModel>) -> Self {
        Self::with_capacity(model, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(model: Arc<dyn BackgroundModel>, capacity: usize) -> Self {
        Self {
            model,
            cache: Arc::new(Mutex::new(ResultCache::new(capacity))),
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    /// Remove the background from `image_data`, returning lossless PNG
    /// bytes with an alpha matte. On any decode or model failure the cache
    /// is left untouched so the caller can retry with the original image.
    pub async fn remove(&self, image_data: &[u8]) -> Result<Vec<u8>> {
        let digest = content_digest(image_data);

        if let Some(cached) = self.cache.lock().unwrap().get(&digest) {
            tracing::debug!("Background-removal cache hit for {}", &digest[..12]);
            return Ok(cached);
        }

        // Decode, normalize, model, restore, and encode are all CPU-bound;
        // run them off the event loop so polling and other users' messages
        // keep making progress.
        let model = Arc::clone(&self.model);
        let input = image_data.to_vec();
        let result = tokio::task::spawn_blocking(move || Self::remove_sync(&model, &input))
            .await
            .map_err(|e| Error::Processing(format!("Background removal task join error: {}", e)))??;

        self.cache.lock().unwrap().insert(digest, result.clone());
        Ok(result)
    }

    fn remove_sync(model: &Arc<dyn BackgroundModel>, image_data: &[u8]) -> Result<Vec<u8>> {
        let decoded = image::load_from_memory(image_data)
            .map_err(|e| Error::Processing(format!("Failed to decode image: {}", e)))?;

        // The matte needs an alpha channel to land in.
        let decoded = match decoded {
            DynamicImage::ImageRgba8(_) => decoded,
            other => DynamicImage::ImageRgba8(other.to_rgba8()),
        };

        let (shrunk, original_size) = SizeNormalizer::shrink(decoded);
        let transformed = model.transform(shrunk)?;
        let restored = SizeNormalizer::restore(transformed, original_size);

        let mut bytes = Vec::new();
        restored
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| Error::Processing(format!("Failed to encode result: {}", e)))?;
        Ok(bytes)
    }
}
