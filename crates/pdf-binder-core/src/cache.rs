//! Bounded in-memory caches for thumbnails and opened PDF sources.
//!
//! Both caches are keyed by value (a [`PageRef`] or a path) and hand out
//! `Arc` clones, so hits are cheap and callers never observe a half-evicted
//! entry. Eviction is size-bounded only; entries never expire on time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use moka::sync::Cache;
use tracing::debug;

use crate::error::Result;
use crate::page::PageRef;
use crate::pdf::PdfSource;

/// Bounded memoization of rendered thumbnail bitmaps.
pub struct ThumbnailCache {
    cache: Cache<PageRef, Arc<RgbaImage>>,
}

impl ThumbnailCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn get(&self, page: &PageRef) -> Option<Arc<RgbaImage>> {
        self.cache.get(page)
    }

    pub fn insert(&self, page: PageRef, bitmap: Arc<RgbaImage>) {
        self.cache.insert(page, bitmap);
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

/// Bounded cache of opened PDF sources, keyed by path.
///
/// A hit serves the bytes read when the path was first opened. Entries are
/// never mutated, so reuse is indistinguishable from reopening except for
/// files that change on disk mid-session. Failed opens are not cached;
/// a fixed file succeeds on the next attempt.
pub struct ReaderCache {
    cache: Cache<PathBuf, Arc<PdfSource>>,
}

impl ReaderCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Fetch the source for `path`, opening and caching it on a miss.
    pub fn get_or_open(&self, path: &Path) -> Result<Arc<PdfSource>> {
        if let Some(source) = self.cache.get(path) {
            debug!(path = %path.display(), "reader cache hit");
            return Ok(source);
        }

        let source = Arc::new(PdfSource::open(path)?);
        self.cache.insert(path.to_path_buf(), Arc::clone(&source));
        Ok(source)
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}
