use std::path::{Path, PathBuf};
use std::sync::Arc;

use lopdf::Document;

use crate::error::{Error, Result};

/// A source PDF opened for page assembly.
///
/// Holds the raw bytes and the page count probed at open time. Parsing
/// handles are created on demand and scoped to the operation that needs
/// them; the cached source itself is never mutated.
pub struct PdfSource {
    path: PathBuf,
    /// The raw PDF bytes (shared with whoever holds a handle)
    bytes: Arc<Vec<u8>>,
    /// Number of pages
    page_count: usize,
}

impl PdfSource {
    /// Open a PDF from bytes.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let path = path.into();
        let bytes = bytes.into();

        // Parse once to validate and count pages
        let doc = Document::load_mem(&bytes).map_err(|e| Error::UnreadablePdf {
            path: path.clone(),
            reason: format!("failed to parse: {e}"),
        })?;
        let page_count = doc.get_pages().len();

        Ok(Self {
            path,
            bytes: Arc::new(bytes),
            page_count,
        })
    }

    /// Open a PDF from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::UnreadablePdf {
            path: path.to_path_buf(),
            reason: format!("failed to read file: {e}"),
        })?;
        Self::from_bytes(path, bytes)
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get number of pages.
    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    /// Get raw PDF bytes as a slice.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Parse a fresh editable document for assembly.
    pub fn load_document(&self) -> Result<Document> {
        Document::load_mem(&self.bytes).map_err(|e| Error::UnreadablePdf {
            path: self.path.clone(),
            reason: format!("failed to parse: {e}"),
        })
    }
}

impl Clone for PdfSource {
    /// Clone the source efficiently.
    ///
    /// This is O(1) - it only clones the `Arc` pointer to the underlying
    /// bytes, not the bytes themselves.
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            bytes: Arc::clone(&self.bytes),
            page_count: self.page_count,
        }
    }
}

impl std::fmt::Debug for PdfSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfSource")
            .field("path", &self.path)
            .field("page_count", &self.page_count)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}
