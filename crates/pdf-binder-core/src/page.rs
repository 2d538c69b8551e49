//! Page references and the ordered page sequence.
//!
//! A [`PageRef`] names one page of the output document by value: the kind of
//! source file, its path, and (for PDFs) the page within it. Equality and
//! hashing cover all three fields, so a `PageRef` doubles as a cache key and
//! the same page can appear in the sequence any number of times.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File extensions recognized as PDF sources.
pub const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// File extensions recognized as raster image sources.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// What kind of source file a page comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// A page copied out of an existing PDF
    Pdf,
    /// A raster image converted to a single page
    Image,
}

/// Classify a path by its extension, case-insensitively.
///
/// Returns `None` for unsupported extensions and for paths without one.
pub fn kind_for_path(path: &Path) -> Option<PageKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if PDF_EXTENSIONS.contains(&ext.as_str()) {
        Some(PageKind::Pdf)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(PageKind::Image)
    } else {
        None
    }
}

/// Whether the path has a supported source extension.
pub fn is_supported_path(path: &Path) -> bool {
    kind_for_path(path).is_some()
}

/// One page of the output document and where its content comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRef {
    kind: PageKind,
    source_path: PathBuf,
    /// 0-based page within the source; `None` for images
    page_index: Option<usize>,
}

impl PageRef {
    /// Reference a single page of a PDF file.
    pub fn pdf_page(path: impl Into<PathBuf>, page_index: usize) -> Self {
        Self {
            kind: PageKind::Pdf,
            source_path: path.into(),
            page_index: Some(page_index),
        }
    }

    /// Reference an image file as a whole page.
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: PageKind::Image,
            source_path: path.into(),
            page_index: None,
        }
    }

    pub const fn kind(&self) -> PageKind {
        self.kind
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub const fn page_index(&self) -> Option<usize> {
        self.page_index
    }

    /// Human-readable label: the file name, plus a 1-based page number
    /// for PDF pages.
    pub fn label(&self) -> String {
        let base = self.source_path.file_name().map_or_else(
            || self.source_path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );

        match (self.kind, self.page_index) {
            (PageKind::Pdf, Some(index)) => format!("{base} \u{2022} p{}", index + 1),
            _ => base,
        }
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The ordered pages of the output document.
///
/// Purely positional: removing and reordering never touch source files,
/// and duplicates are allowed.
#[derive(Debug, Clone, Default)]
pub struct PageSequence {
    pages: Vec<PageRef>,
}

impl PageSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one page.
    pub fn push(&mut self, page: PageRef) {
        self.pages.push(page);
    }

    /// Append pages in order.
    pub fn extend(&mut self, pages: impl IntoIterator<Item = PageRef>) {
        self.pages.extend(pages);
    }

    /// Remove and return the page at `index`.
    pub fn remove(&mut self, index: usize) -> Result<PageRef> {
        if index >= self.pages.len() {
            return Err(Error::InvalidSequenceIndex {
                index,
                len: self.pages.len(),
            });
        }
        Ok(self.pages.remove(index))
    }

    /// Move the page at `from` so it ends up at position `to`.
    ///
    /// `to` addresses a position in the current sequence, including the
    /// page's own slot, so moving to the same index is a no-op.
    pub fn move_page(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.pages.len();
        if from >= len {
            return Err(Error::InvalidSequenceIndex { index: from, len });
        }
        if to >= len {
            return Err(Error::InvalidSequenceIndex { index: to, len });
        }
        let page = self.pages.remove(from);
        self.pages.insert(to, page);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&PageRef> {
        self.pages.get(index)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageRef> {
        self.pages.iter()
    }

    pub fn pages(&self) -> &[PageRef] {
        &self.pages
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    /// Labels prefixed with their 1-based position, for listings.
    pub fn numbered_labels(&self) -> Vec<String> {
        self.pages
            .iter()
            .enumerate()
            .map(|(i, page)| format!("{}. {}", i + 1, page.label()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a PageSequence {
    type Item = &'a PageRef;
    type IntoIter = std::slice::Iter<'a, PageRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
