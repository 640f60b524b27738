//! Bounded LRU cache of decoded thumbnails.

use super::decoder::{ImageDecoder, ThumbnailDecoder, ThumbnailError, ThumbnailSize};
use image::RgbaImage;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

/// Default number of thumbnails kept in memory.
pub const DEFAULT_CAPACITY: usize = 300;

/// Shared, read-only handle to a cached bitmap.
pub type Thumbnail = Arc<RgbaImage>;

struct CachedThumbnail {
    mtime: SystemTime,
    size: ThumbnailSize,
    bitmap: Thumbnail,
}

/// In-memory LRU cache of thumbnails keyed by image path.
///
/// An entry is only served while the file's modification time matches the
/// one recorded when it was decoded, so a re-exported preview is picked up
/// on the next access. The cache never writes to disk.
///
/// The LRU structure sits behind a mutex; decoding happens outside the lock,
/// so the cache can be shared between rendering threads.
pub struct ThumbnailCache<D = ImageDecoder> {
    decoder: D,
    entries: Mutex<LruCache<PathBuf, CachedThumbnail>>,
    decodes: AtomicU64,
}

impl ThumbnailCache<ImageDecoder> {
    /// Create a cache backed by the `image` crate decoder.
    pub fn new(capacity: usize) -> Self {
        Self::with_decoder(capacity, ImageDecoder)
    }
}

impl Default for ThumbnailCache<ImageDecoder> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<D: ThumbnailDecoder> ThumbnailCache<D> {
    /// Create a cache with a custom decoder. A capacity of 0 is treated as 1.
    pub fn with_decoder(capacity: usize, decoder: D) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            decoder,
            entries: Mutex::new(LruCache::new(capacity)),
            decodes: AtomicU64::new(0),
        }
    }

    /// Return the thumbnail for `path`, decoding it on a miss.
    ///
    /// Returns `None` if the path is missing, not a regular file or not a
    /// decodable image; callers show a placeholder.
    pub fn get_or_create(&self, path: &Path, size: ThumbnailSize) -> Option<Thumbnail> {
        match self.try_get_or_create(path, size) {
            Ok(thumb) => Some(thumb),
            Err(e) => {
                log::debug!("No thumbnail for {}: {}", path.display(), e);
                self.entries.lock().pop(path);
                None
            }
        }
    }

    fn try_get_or_create(
        &self,
        path: &Path,
        size: ThumbnailSize,
    ) -> Result<Thumbnail, ThumbnailError> {
        let mtime = modified_time(path)?;

        {
            let mut entries = self.entries.lock();
            if let Some(entry) = entries.get(path) {
                if entry.mtime == mtime && entry.size == size {
                    return Ok(Arc::clone(&entry.bitmap));
                }
                log::trace!("Stale thumbnail for {}", path.display());
            }
        }

        self.decodes.fetch_add(1, Ordering::Relaxed);
        let bitmap = Arc::new(self.decoder.decode(path, size)?);

        let mut entries = self.entries.lock();
        if let Some((evicted, _)) = entries.push(
            path.to_path_buf(),
            CachedThumbnail {
                mtime,
                size,
                bitmap: Arc::clone(&bitmap),
            },
        ) {
            if evicted.as_path() != path {
                log::trace!("Evicted thumbnail {}", evicted.display());
            }
        }
        Ok(bitmap)
    }

    /// Drop every cached thumbnail.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Whether `path` has an entry, without touching its recency.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.lock().contains(path)
    }

    /// Number of decodes performed since creation.
    pub fn decode_count(&self) -> u64 {
        self.decodes.load(Ordering::Relaxed)
    }
}

fn modified_time(path: &Path) -> Result<SystemTime, ThumbnailError> {
    let io = |e| ThumbnailError::Io(path.display().to_string(), e);
    let meta = std::fs::metadata(path).map_err(io)?;
    if !meta.is_file() {
        return Err(ThumbnailError::NotAFile(path.display().to_string()));
    }
    meta.modified().map_err(io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_zero_capacity_becomes_one() {
        let cache = ThumbnailCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(ThumbnailCache::default().capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let cache = ThumbnailCache::default();
        let missing = dir.path().join("missing.png");
        assert!(cache.get_or_create(&missing, ThumbnailSize::default()).is_none());
        assert_eq!(cache.decode_count(), 0);
    }

    #[test]
    fn test_directory_is_none() {
        let dir = tempdir().unwrap();
        let cache = ThumbnailCache::default();
        assert!(cache.get_or_create(dir.path(), ThumbnailSize::default()).is_none());
    }

    #[test]
    fn test_real_png_hit_shares_bitmap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preview.png");
        image::RgbImage::from_pixel(60, 30, image::Rgb([200, 10, 10]))
            .save(&path)
            .unwrap();

        let cache = ThumbnailCache::default();
        let size = ThumbnailSize::new(30, 30);
        let first = cache.get_or_create(&path, size).unwrap();
        let second = cache.get_or_create(&path, size).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.dimensions(), (30, 15));
        assert_eq!(cache.decode_count(), 1);
    }

    #[test]
    fn test_different_size_redecodes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preview.png");
        image::RgbImage::new(80, 80).save(&path).unwrap();

        let cache = ThumbnailCache::default();
        cache.get_or_create(&path, ThumbnailSize::new(40, 40)).unwrap();
        let small = cache.get_or_create(&path, ThumbnailSize::new(20, 20)).unwrap();
        assert_eq!(small.dimensions(), (20, 20));
        assert_eq!(cache.decode_count(), 2);
        assert_eq!(cache.len(), 1);
    }
}
