mod assemble;
mod convert;
mod document;
mod page_index;
mod render;

pub use assemble::{assemble_sequence, normalize_extension, save_document};
pub use convert::image_to_pdf_bytes;
pub use document::PdfSource;
pub use page_index::PageIndex;
pub use render::{RasterOptions, rasterize_page};
