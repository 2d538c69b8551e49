use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for pdf-binder-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - PDF operations (opening, reading, rendering)
/// - Image operations (decoding, converting to pages)
/// - Sequence operations (indexing, reordering)
/// - Export operations (assembling, writing the output)
/// - Configuration operations (loading, validation)
/// - General I/O operations
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// Failed to open or parse a PDF file
    #[error("failed to read PDF {}: {reason}", .path.display())]
    UnreadablePdf { path: PathBuf, reason: String },

    /// Invalid page number requested
    #[error("invalid page number {page} (document has {total} pages)")]
    InvalidPage { page: usize, total: usize },

    /// Failed to rasterize a PDF page
    #[error("failed to render page {page}: {reason}")]
    Render { page: usize, reason: String },

    // ==========================================================================
    // Image Errors
    // ==========================================================================
    /// Failed to decode an image file
    #[error("failed to decode image {}: {reason}", .path.display())]
    ImageDecode { path: PathBuf, reason: String },

    // ==========================================================================
    // Sequence Errors
    // ==========================================================================
    /// File extension is not a supported page source
    #[error("unsupported file type: {}", .0.display())]
    UnsupportedFile(PathBuf),

    /// Position outside the current page sequence
    #[error("sequence index {index} out of bounds (sequence has {len} pages)")]
    InvalidSequenceIndex { index: usize, len: usize },

    // ==========================================================================
    // Export Errors
    // ==========================================================================
    /// Export requested with an empty page sequence
    #[error("nothing to export: the page sequence is empty")]
    NothingToExport,

    /// Failed to build the combined document
    #[error("failed to assemble output document: {0}")]
    Assemble(String),

    /// Failed to write the output PDF
    #[error("failed to write output PDF {}: {reason}", .path.display())]
    WriteOutput { path: PathBuf, reason: String },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
