use image::RgbaImage;
use mupdf::{Colorspace, Document as MuDocument, Matrix};

use super::page_index::PageIndex;
use crate::error::{Error, Result};

/// Sizing parameters for rasterizing a page into a bounding box.
#[derive(Debug, Clone, Copy)]
pub struct RasterOptions {
    /// Bounding box width in pixels
    pub box_width: f32,
    /// Bounding box height in pixels
    pub box_height: f32,
    /// Lower clamp for the fitted scale
    pub min_scale: f32,
    /// Multiple of the fitted scale to rasterize at
    pub oversample: f32,
}

impl RasterOptions {
    /// Scale that fits a page of the given point size into the box.
    ///
    /// Uses the tighter of the two axis ratios, clamped from below so
    /// near-zero pages still produce something visible. Small pages may
    /// scale up; the caller decides whether to downscale afterwards.
    pub fn fit_scale(&self, page_width: f32, page_height: f32) -> f32 {
        let scale = (self.box_width / page_width.max(1.0))
            .min(self.box_height / page_height.max(1.0));
        scale.max(self.min_scale)
    }
}

/// Rasterize one page of a PDF to an RGBA bitmap sized for a preview box.
///
/// The page is rendered at `oversample` times the fitted scale; the caller
/// downscales into the box afterwards. An out-of-range page index falls
/// back to the first page rather than failing.
pub fn rasterize_page(
    pdf_bytes: &[u8],
    page_index: PageIndex,
    opts: &RasterOptions,
) -> Result<RgbaImage> {
    let page_num = page_index.as_usize();

    let doc = MuDocument::from_bytes(pdf_bytes, "").map_err(|e| Error::Render {
        page: page_num,
        reason: format!("Failed to open document: {e}"),
    })?;

    let total = doc.page_count().map_err(|e| Error::Render {
        page: page_num,
        reason: format!("Failed to get page count: {e}"),
    })?;
    let total = usize::try_from(total).unwrap_or(0);

    let page = doc
        .load_page(page_index.clamped_to(total).into())
        .map_err(|e| Error::Render {
            page: page_num,
            reason: format!("Failed to load page: {e}"),
        })?;

    let bounds = page.bounds().map_err(|e| Error::Render {
        page: page_num,
        reason: format!("Failed to get bounds: {e}"),
    })?;

    let scale = opts.fit_scale(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0) * opts.oversample;

    // Create transformation matrix for scaling
    let matrix = Matrix::new_scale(scale, scale);

    // Render to pixmap (RGBA)
    let pixmap = page
        .to_pixmap(&matrix, &Colorspace::device_rgb(), 1.0, true)
        .map_err(|e| Error::Render {
            page: page_num,
            reason: format!("Failed to render: {e}"),
        })?;

    // Convert to image
    let pixels = pixmap.samples();
    let img_width = pixmap.width();
    let img_height = pixmap.height();

    // mupdf returns RGB, we need RGBA
    let n = pixmap.n() as usize; // components per pixel
    let mut rgba_pixels = Vec::with_capacity((img_width * img_height * 4) as usize);

    for chunk in pixels.chunks(n) {
        match n {
            3 => {
                // RGB -> RGBA
                rgba_pixels.push(chunk[0]);
                rgba_pixels.push(chunk[1]);
                rgba_pixels.push(chunk[2]);
                rgba_pixels.push(255);
            }
            4 => {
                // Already RGBA
                rgba_pixels.extend_from_slice(chunk);
            }
            1 => {
                // Grayscale -> RGBA
                rgba_pixels.push(chunk[0]);
                rgba_pixels.push(chunk[0]);
                rgba_pixels.push(chunk[0]);
                rgba_pixels.push(255);
            }
            _ => {
                return Err(Error::Render {
                    page: page_num,
                    reason: format!("Unexpected pixel format with {n} components"),
                });
            }
        }
    }

    RgbaImage::from_raw(img_width, img_height, rgba_pixels).ok_or_else(|| Error::Render {
        page: page_num,
        reason: "Failed to create image buffer".to_string(),
    })
}
