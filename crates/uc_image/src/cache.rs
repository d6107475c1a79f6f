//! LRU image cache with a byte budget
//!
//! Entries are keyed by canonical file path, or by a content hash for
//! in-memory images. All access is serialized by one mutex; lookups clone
//! the `Arc` handle out while the lock is held. Decoding happens outside
//! the lock.

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use lru::LruCache;
use rustc_hash::FxHasher;
use tracing::{debug, trace};

use crate::data::ImageData;
use crate::error::{ImageError, Result};
use crate::plugin::{extension_of, DefaultImagePlugin, ImagePlugin};

/// Default budget: 64 MiB of decoded pixels
pub const DEFAULT_CACHE_BUDGET: usize = 64 * 1024 * 1024;

/// Cache key
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageKey {
    Path(PathBuf),
    Content(u64),
}

impl ImageKey {
    /// Key for a file path, canonicalized when the file exists
    pub fn for_path(path: &Path) -> Self {
        ImageKey::Path(std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()))
    }

    /// Key for in-memory content
    pub fn for_content(bytes: &[u8]) -> Self {
        let mut hasher = FxHasher::default();
        bytes.hash(&mut hasher);
        ImageKey::Content(hasher.finish())
    }
}

struct CacheInner {
    entries: LruCache<ImageKey, Arc<ImageData>>,
    used_bytes: usize,
    budget: usize,
}

impl CacheInner {
    fn evict_to(&mut self, limit: usize) {
        while self.used_bytes > limit {
            match self.entries.pop_lru() {
                Some((key, image)) => {
                    self.used_bytes -= image.byte_len();
                    trace!(?key, "evicted image");
                }
                None => break,
            }
        }
    }
}

/// Shared image cache
pub struct ImageCache {
    inner: Mutex<CacheInner>,
    plugins: RwLock<Vec<Arc<dyn ImagePlugin>>>,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_BUDGET)
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ImageCache")
            .field("entries", &inner.entries.len())
            .field("used_bytes", &inner.used_bytes)
            .field("budget", &inner.budget)
            .finish()
    }
}

impl ImageCache {
    /// Create a cache with the default decoder plugin registered
    pub fn new(budget: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::unbounded(),
                used_bytes: 0,
                budget,
            }),
            plugins: RwLock::new(vec![Arc::new(DefaultImagePlugin)]),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a decoder; later registrations take precedence
    pub fn register_plugin(&self, plugin: Arc<dyn ImagePlugin>) {
        let mut plugins = self
            .plugins
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        debug!(plugin = plugin.name(), "registered image plugin");
        plugins.insert(0, plugin);
    }

    fn plugin_for(&self, path: &Path) -> Option<Arc<dyn ImagePlugin>> {
        let ext = extension_of(path)?;
        let plugins = self
            .plugins
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        plugins.iter().find(|p| p.can_handle(&ext)).cloned()
    }

    /// True if some registered plugin handles the path's extension
    pub fn is_format_supported(&self, path: &str) -> bool {
        path.starts_with("data:image/") || self.plugin_for(Path::new(path)).is_some()
    }

    fn get(&self, key: &ImageKey) -> Option<Arc<ImageData>> {
        self.lock().entries.get(key).cloned()
    }

    fn store(&self, key: ImageKey, image: ImageData) -> Arc<ImageData> {
        let image = Arc::new(image);
        let size = image.byte_len();
        let mut inner = self.lock();

        if size > inner.budget {
            debug!(?key, size, budget = inner.budget, "image exceeds cache budget, not cached");
            return image;
        }
        if let Some(old) = inner.entries.pop(&key) {
            inner.used_bytes -= old.byte_len();
        }
        let limit = inner.budget - size;
        inner.evict_to(limit);
        inner.used_bytes += size;
        inner.entries.put(key, Arc::clone(&image));
        image
    }

    /// Load an image by path or `data:` URI, using the cache
    pub fn load(&self, path: &str) -> Result<Arc<ImageData>> {
        if path.starts_with("data:") {
            let key = ImageKey::for_content(path.as_bytes());
            if let Some(hit) = self.get(&key) {
                return Ok(hit);
            }
            let image = ImageData::from_base64(path)?;
            return Ok(self.store(key, image));
        }

        let file = Path::new(path);
        let key = ImageKey::for_path(file);
        if let Some(hit) = self.get(&key) {
            trace!(path, "image cache hit");
            return Ok(hit);
        }

        let plugin = self
            .plugin_for(file)
            .ok_or_else(|| ImageError::UnsupportedFormat(path.to_string()))?;
        let image = plugin.load(file)?;
        Ok(self.store(key, image))
    }

    /// Decode encoded bytes, keyed by content hash
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<Arc<ImageData>> {
        let key = ImageKey::for_content(bytes);
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let image = ImageData::from_bytes(bytes)?;
        Ok(self.store(key, image))
    }

    /// Insert already-decoded pixels under a path key
    pub fn insert(&self, path: &str, image: ImageData) -> Arc<ImageData> {
        self.store(ImageKey::for_path(Path::new(path)), image)
    }

    /// Natural size of an image, loading it if needed
    pub fn dimensions(&self, path: &str) -> Option<(u32, u32)> {
        self.load(path).ok().map(|img| img.dimensions())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock()
            .entries
            .contains(&ImageKey::for_path(Path::new(path)))
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn used_bytes(&self) -> usize {
        self.lock().used_bytes
    }

    pub fn budget(&self) -> usize {
        self.lock().budget
    }

    /// Change the budget, evicting as needed
    pub fn set_budget(&self, budget: usize) {
        let mut inner = self.lock();
        inner.budget = budget;
        inner.evict_to(budget);
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.used_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: u32) -> ImageData {
        ImageData::filled(side, side, [10, 20, 30, 255])
    }

    #[test]
    fn test_lru_eviction_by_budget() {
        // each 4x4 image is 64 bytes
        let cache = ImageCache::new(160);
        cache.insert("/virtual/a.png", square(4));
        cache.insert("/virtual/b.png", square(4));

        // touch a so b becomes least recently used
        assert!(cache.load("/virtual/a.png").is_ok());

        cache.insert("/virtual/c.png", square(4));
        assert!(cache.contains("/virtual/a.png"));
        assert!(!cache.contains("/virtual/b.png"));
        assert!(cache.contains("/virtual/c.png"));
        assert_eq!(cache.used_bytes(), 128);
    }

    #[test]
    fn test_oversized_image_not_cached() {
        let cache = ImageCache::new(32);
        let image = cache.insert("/virtual/big.png", square(4));
        assert_eq!(image.dimensions(), (4, 4));
        assert!(cache.is_empty());
        assert_eq!(cache.used_bytes(), 0);
    }

    #[test]
    fn test_reinsert_replaces_accounting() {
        let cache = ImageCache::new(1024);
        cache.insert("/virtual/a.png", square(4));
        cache.insert("/virtual/a.png", square(2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.used_bytes(), 16);
    }

    #[test]
    fn test_shrinking_budget_evicts() {
        let cache = ImageCache::new(1024);
        cache.insert("/virtual/a.png", square(4));
        cache.insert("/virtual/b.png", square(4));
        cache.set_budget(64);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("/virtual/b.png"));
    }

    #[test]
    fn test_data_uri_loaded_by_content_hash() {
        let cache = ImageCache::default();
        let uri = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";
        let first = cache.load(uri).unwrap();
        let second = cache.load(uri).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.dimensions(uri), Some((1, 1)));
    }

    #[test]
    fn test_unknown_format_and_missing_file() {
        let cache = ImageCache::default();
        assert!(matches!(
            cache.load("/virtual/doc.pdf"),
            Err(ImageError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            cache.load("/virtual/missing.png"),
            Err(ImageError::FileLoad(_))
        ));
        assert!(cache.is_format_supported("photo.JPEG"));
        assert!(!cache.is_format_supported("notes.txt"));
    }

    #[test]
    fn test_content_keys_match_for_equal_bytes() {
        assert_eq!(
            ImageKey::for_content(b"abc"),
            ImageKey::for_content(b"abc")
        );
        assert_ne!(
            ImageKey::for_content(b"abc"),
            ImageKey::for_content(b"abd")
        );
    }
}
