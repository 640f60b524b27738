//! Thumbnail caching for the project grid.
//!
//! Decoding and resizing preview images is the expensive part of rendering
//! a page of cards, so decoded bitmaps are kept in a bounded LRU cache.
//!
//! * [`decoder`]: The [`ThumbnailDecoder`] seam and the `image`-backed [`ImageDecoder`].
//! * [`cache`]: [`ThumbnailCache`], keyed by path and invalidated by modification time.
//!
//! # Cache Invalidation
//!
//! Every access stats the file. An entry is served only if the file's mtime
//! and the requested size match the ones it was decoded with; otherwise the
//! image is decoded again and the entry replaced. A touch without a content
//! change therefore costs one extra decode.

pub mod cache;
pub mod decoder;

pub use cache::{Thumbnail, ThumbnailCache, DEFAULT_CAPACITY};
pub use decoder::{ImageDecoder, ThumbnailDecoder, ThumbnailError, ThumbnailSize};
