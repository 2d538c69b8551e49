//! PDF Binder Core Library
//!
//! This library provides the core functionality for assembling a new PDF
//! out of pages from existing documents and image files:
//! - Page references and an ordered, reorderable page sequence
//! - Thumbnail rendering with bounded memoization
//! - Image-to-page conversion (lossless, DPI-sized)
//! - Export: copying source pages into one combined document

pub mod cache;
pub mod config;
pub mod error;
pub mod page;
pub mod pdf;
pub mod thumbnail;
pub mod util;

pub use cache::{ReaderCache, ThumbnailCache};
pub use config::{AppConfig, CacheConfig, ConvertConfig, ThumbnailConfig};
pub use error::{Error, Result};
pub use page::{
    IMAGE_EXTENSIONS, PDF_EXTENSIONS, PageKind, PageRef, PageSequence, is_supported_path,
    kind_for_path,
};
pub use pdf::{PageIndex, PdfSource, image_to_pdf_bytes, normalize_extension};
pub use thumbnail::ThumbnailGenerator;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info, warn};

/// High-level page assembler that combines all components
pub struct PageAssembler {
    config: AppConfig,
    sequence: PageSequence,
    thumbnails: ThumbnailGenerator,
    readers: ReaderCache,
}

/// Outcome of adding a batch of files
#[derive(Debug, Default)]
pub struct AddReport {
    /// Pages appended to the sequence, in order
    pub added: Vec<PageRef>,
    /// Files that looked supported but failed to open
    pub failures: Vec<(PathBuf, Error)>,
}

impl AddReport {
    /// Whether every supported file in the batch was added.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Default for PageAssembler {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl PageAssembler {
    /// Create a new page assembler with the given configuration
    pub fn new(config: AppConfig) -> Self {
        let thumbnails = ThumbnailGenerator::new(config.thumbnail, config.cache.thumbnail_capacity);
        let readers = ReaderCache::new(config.cache.reader_capacity);

        Self {
            config,
            sequence: PageSequence::new(),
            thumbnails,
            readers,
        }
    }

    /// Add every supported file in `paths` to the sequence, in order.
    ///
    /// Paths that do not exist or have an unsupported extension are skipped
    /// silently. A file that looks supported but fails to open is recorded
    /// in the report and the rest of the batch still goes in.
    pub fn add_files(&mut self, paths: &[PathBuf]) -> AddReport {
        let mut report = AddReport::default();

        for path in paths {
            if !path.is_file() || !is_supported_path(path) {
                continue;
            }
            match self.add_file(path) {
                Ok(mut pages) => report.added.append(&mut pages),
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping file");
                    report.failures.push((path.clone(), error));
                }
            }
        }

        debug!("{}", self.status());
        report
    }

    /// Append one file to the sequence.
    ///
    /// A PDF contributes one page reference per page, an image exactly one.
    /// Returns the references that were appended.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<PageRef>> {
        let path = path.as_ref();

        let pages = match kind_for_path(path) {
            Some(PageKind::Pdf) => {
                let source = self.readers.get_or_open(path)?;
                (0..source.page_count())
                    .map(|index| PageRef::pdf_page(path, index))
                    .collect()
            }
            Some(PageKind::Image) => vec![PageRef::image(path)],
            None => return Err(Error::UnsupportedFile(path.to_path_buf())),
        };

        self.sequence.extend(pages.iter().cloned());
        Ok(pages)
    }

    /// Remove and return the page at `index`.
    pub fn remove_page(&mut self, index: usize) -> Result<PageRef> {
        let removed = self.sequence.remove(index)?;
        debug!(page = %removed, "removed page");
        Ok(removed)
    }

    /// Move the page at `from` to position `to`.
    pub fn move_page(&mut self, from: usize, to: usize) -> Result<()> {
        self.sequence.move_page(from, to)
    }

    /// The current sequence, in output order.
    pub fn pages(&self) -> &[PageRef] {
        self.sequence.pages()
    }

    pub const fn sequence(&self) -> &PageSequence {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Position-numbered page labels for listings.
    pub fn labels(&self) -> Vec<String> {
        self.sequence.numbered_labels()
    }

    /// One-line status summary.
    pub fn status(&self) -> String {
        format!("Total pages: {}", self.sequence.len())
    }

    /// Preview bitmap for a page; never fails, falls back to a placeholder.
    pub fn thumbnail(&self, page: &PageRef) -> Arc<RgbaImage> {
        self.thumbnails.render(page)
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Drop cached thumbnails and opened sources.
    pub fn clear_caches(&self) {
        self.thumbnails.clear();
        self.readers.clear();
    }

    /// Export the sequence as a combined PDF at `out_path`.
    ///
    /// The extension is normalized to `.pdf`, the document is assembled in
    /// sequence order, and the file is written atomically. Returns the path
    /// actually written. Fails up front if the sequence is empty, before
    /// anything touches the filesystem.
    pub fn export(&self, out_path: impl AsRef<Path>) -> Result<PathBuf> {
        if self.sequence.is_empty() {
            return Err(Error::NothingToExport);
        }

        let out_path = normalize_extension(out_path.as_ref());
        info!(
            pages = self.sequence.len(),
            out = %out_path.display(),
            "exporting combined document"
        );

        let mut document =
            pdf::assemble_sequence(&self.sequence, &self.readers, self.config.convert)?;
        pdf::save_document(&mut document, &out_path)?;

        info!(out = %out_path.display(), "export complete");
        Ok(out_path)
    }
}
