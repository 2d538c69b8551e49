//! Thumbnail generation with bounded memoization.
//!
//! Thumbnails are best-effort previews: any failure along the way (missing
//! file, corrupt source, render error) produces a flat gray placeholder of
//! the full box size instead of an error. Results, placeholders included,
//! are cached by [`PageRef`] value so repeated requests for the same page
//! return the same bitmap.

use std::sync::Arc;

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::cache::ThumbnailCache;
use crate::config::ThumbnailConfig;
use crate::error::{Error, Result};
use crate::page::{PageKind, PageRef};
use crate::pdf::{PageIndex, RasterOptions, rasterize_page};

/// Flat neutral gray for pages that cannot be previewed.
const PLACEHOLDER_GRAY: Rgba<u8> = Rgba([192, 192, 192, 255]);

/// Renders preview bitmaps for page references.
pub struct ThumbnailGenerator {
    config: ThumbnailConfig,
    cache: ThumbnailCache,
}

impl ThumbnailGenerator {
    pub fn new(config: ThumbnailConfig, cache_capacity: u64) -> Self {
        Self {
            config,
            cache: ThumbnailCache::new(cache_capacity),
        }
    }

    /// Render the preview bitmap for a page, memoized by page reference.
    ///
    /// Never fails: problems yield the gray placeholder, which is cached
    /// like a regular result so broken sources are not re-probed on every
    /// request.
    pub fn render(&self, page: &PageRef) -> Arc<RgbaImage> {
        if let Some(hit) = self.cache.get(page) {
            debug!(page = %page, "thumbnail cache hit");
            return hit;
        }

        let bitmap = match self.render_fresh(page) {
            Ok(bitmap) => bitmap,
            Err(error) => {
                debug!(page = %page, %error, "thumbnail fell back to placeholder");
                self.placeholder()
            }
        };

        let bitmap = Arc::new(bitmap);
        self.cache.insert(page.clone(), Arc::clone(&bitmap));
        bitmap
    }

    /// A full-box flat gray bitmap.
    pub fn placeholder(&self) -> RgbaImage {
        RgbaImage::from_pixel(
            self.config.max_width,
            self.config.max_height,
            PLACEHOLDER_GRAY,
        )
    }

    /// Drop all cached thumbnails.
    pub fn clear(&self) {
        self.cache.clear();
    }

    fn render_fresh(&self, page: &PageRef) -> Result<RgbaImage> {
        let bitmap = match page.kind() {
            PageKind::Image => image::open(page.source_path())
                .map_err(|e| Error::ImageDecode {
                    path: page.source_path().to_path_buf(),
                    reason: e.to_string(),
                })?
                .to_rgba8(),
            PageKind::Pdf => {
                let bytes = std::fs::read(page.source_path())?;
                let index = PageIndex::try_from(page.page_index().unwrap_or(0))?;
                rasterize_page(&bytes, index, &self.raster_options())?
            }
        };

        Ok(self.fit_to_box(bitmap))
    }

    #[allow(clippy::cast_precision_loss)]
    fn raster_options(&self) -> RasterOptions {
        RasterOptions {
            box_width: self.config.max_width as f32,
            box_height: self.config.max_height as f32,
            min_scale: self.config.min_scale,
            oversample: self.config.oversample,
        }
    }

    /// Downscale into the bounding box, preserving aspect ratio.
    ///
    /// Bitmaps already inside the box are returned untouched; thumbnails
    /// only ever shrink here, the oversampled rasterization is what keeps
    /// them sharp.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn fit_to_box(&self, bitmap: RgbaImage) -> RgbaImage {
        let (width, height) = bitmap.dimensions();
        let (max_width, max_height) = (self.config.max_width, self.config.max_height);
        if width <= max_width && height <= max_height {
            return bitmap;
        }

        let ratio = (max_width as f32 / width as f32).min(max_height as f32 / height as f32);
        let new_width = ((width as f32 * ratio).round() as u32).max(1);
        let new_height = ((height as f32 * ratio).round() as u32).max(1);

        image::imageops::resize(&bitmap, new_width, new_height, FilterType::Lanczos3)
    }
}
